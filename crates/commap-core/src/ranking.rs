//! Author ranking and top-author selection.
//!
//! A ranking maps every address seen in a corpus to a score and returns
//! the addresses best first. [`TopAuthorSet`] keeps the leading `n` entries
//! of a ranking; it decides which authors become graph nodes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::corpus::Corpus;

/// Default number of authors kept in a [`TopAuthorSet`].
pub const DEFAULT_TOP_N: usize = 100;

/// A source of ranked `(address, score)` pairs, best first.
pub trait AuthorRanking {
    /// Rank all authors in `corpus`.
    fn rank(&self, corpus: &Corpus) -> Vec<(String, f64)>;
}

/// Activity-weighted ranking.
///
/// Every message credits its sender with `active_score` and each of its
/// recipients (`To ∪ Cc`) with `passive_score`. Ties are broken by address
/// so that the ordering is deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityRanking {
    pub active_score: f64,
    pub passive_score: f64,
}

impl Default for ActivityRanking {
    fn default() -> Self {
        Self {
            active_score: 2.0,
            passive_score: 1.0,
        }
    }
}

impl AuthorRanking for ActivityRanking {
    #[instrument(skip(corpus), fields(messages = corpus.len()))]
    fn rank(&self, corpus: &Corpus) -> Vec<(String, f64)> {
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for message in corpus.messages() {
            *scores.entry(message.from.as_str()).or_default() += self.active_score;
            for recipient in message.recipients() {
                *scores.entry(recipient).or_default() += self.passive_score;
            }
        }

        let mut ranked: Vec<(String, f64)> = scores
            .into_iter()
            .map(|(addr, score)| (addr.to_string(), score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        debug!(authors = ranked.len(), "authors ranked");
        ranked
    }
}

/// The highest-ranked authors, in rank order, with their scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopAuthorSet {
    ranked: Vec<(String, f64)>,
    members: HashSet<String>,
}

impl TopAuthorSet {
    /// Keep the first `n` entries of `ranked`.
    ///
    /// Duplicate addresses keep their first (best) position.
    #[must_use]
    pub fn from_ranking<I>(ranked: I, n: usize) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut set = Self::default();
        for (addr, score) in ranked {
            if set.ranked.len() == n {
                break;
            }
            if set.members.insert(addr.clone()) {
                set.ranked.push((addr, score));
            }
        }
        set
    }

    /// Rank `corpus` with `ranking` and keep the top `n`.
    #[must_use]
    pub fn select(corpus: &Corpus, ranking: &dyn AuthorRanking, n: usize) -> Self {
        Self::from_ranking(ranking.rank(corpus), n)
    }

    /// Returns `true` if `addr` is a top author.
    #[must_use]
    pub fn contains(&self, addr: &str) -> bool {
        self.members.contains(addr)
    }

    /// Membership set, for graph construction.
    #[must_use]
    pub const fn members(&self) -> &HashSet<String> {
        &self.members
    }

    /// `(address, score)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ranked.iter().map(|(addr, score)| (addr.as_str(), *score))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}
