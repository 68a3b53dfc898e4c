//! Email message corpus.
//!
//! A corpus is a JSON object keyed by message id. Each value carries the
//! sender (`From`), the primary recipients (`To`) and optionally the carbon
//! copy recipients (`Cc`):
//!
//! ```json
//! {
//!   "<m1@list>": { "From": "a@x.com", "To": ["b@x.com"], "Cc": null },
//!   "<m2@list>": { "From": "b@x.com", "To": "a@x.com, c@x.com" }
//! }
//! ```
//!
//! `To` and `Cc` accept either an array of addresses or a single
//! comma-separated string. A missing or `null` `Cc` is treated as empty.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

/// Errors raised while loading a corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// The corpus file could not be read.
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The corpus file is not a valid message map.
    #[error("failed to parse corpus {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single email message, reduced to its correspondence fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To", default, deserialize_with = "address_set")]
    pub to: BTreeSet<String>,
    #[serde(rename = "Cc", default, deserialize_with = "optional_address_set")]
    pub cc: Option<BTreeSet<String>>,
}

impl Message {
    /// Build a message from borrowed addresses.
    #[must_use]
    pub fn new(from: &str, to: &[&str], cc: Option<&[&str]>) -> Self {
        Self {
            from: from.to_string(),
            to: to.iter().map(|s| (*s).to_string()).collect(),
            cc: cc.map(|cc| cc.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    /// All recipients of the message: `To ∪ Cc`.
    ///
    /// A message without `Cc` yields exactly its `To` set.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        let cc_only = self
            .cc
            .iter()
            .flatten()
            .filter(|addr| !self.to.contains(*addr));
        self.to.iter().chain(cc_only).map(String::as_str)
    }
}

/// Messages keyed by message id, iterated in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    messages: BTreeMap<String, Message>,
}

impl Corpus {
    /// Load a corpus from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError`] if the file cannot be read or parsed.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let raw = fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_json_str(&raw).map_err(|source| CorpusError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(messages = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// Parse a corpus from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error on malformed input.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Insert (or replace) a message under `id`.
    pub fn insert(&mut self, id: impl Into<String>, message: Message) {
        self.messages.insert(id.into(), message);
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` when the corpus holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate `(message id, message)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.messages.iter().map(|(id, msg)| (id.as_str(), msg))
    }

    /// Iterate messages in id order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }
}

impl FromIterator<(String, Message)> for Corpus {
    fn from_iter<I: IntoIterator<Item = (String, Message)>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Address field decoding
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressField {
    List(Vec<String>),
    Joined(String),
}

impl AddressField {
    fn into_set(self) -> BTreeSet<String> {
        let raw: Vec<String> = match self {
            Self::List(list) => list,
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect()
    }
}

fn address_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<AddressField>::deserialize(deserializer)?;
    Ok(field.map(AddressField::into_set).unwrap_or_default())
}

fn optional_address_set<'de, D>(deserializer: D) -> Result<Option<BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<AddressField>::deserialize(deserializer)?;
    Ok(field.map(AddressField::into_set))
}
