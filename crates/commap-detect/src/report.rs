//! Per-author report: graph statistics joined with tree module flow.
//!
//! # Join
//!
//! 1. Compute degree and clustering statistics for the author graph.
//! 2. Seed one [`AuthorRecord`] per top author, in rank order.
//! 3. Stream the tree file and attach each listed author's flow.
//! 4. Resolve gaps per [`MissingFlowPolicy`]: fail, or leave the flow empty.
//!    Top authors with no edge among the top set are not graph nodes, so
//!    the tool never sees them; their flow is always empty.
//!
//! # Output
//!
//! ```text
//! Email Address,Author Score,In-Degree,Out-Degree,Clustering Coeff,Module Flow
//! a@x.com,12,3,4,0.5,0.25
//! b@x.com,7,1,0,0,
//! ```
//!
//! Every row has six fields; a missing flow is an empty field. The file is
//! written to a sibling `.tmp` path and renamed into place only after the
//! join succeeded.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use commap_core::config::MissingFlowPolicy;
use commap_core::ranking::TopAuthorSet;
use tracing::{debug, info, instrument, warn};

use crate::error::{DetectError, MissingDataError, ParseError, Result};
use crate::graph::{AuthorGraph, AuthorMetrics};
use crate::tree::{TreeLine, TreeReader};

/// Column header of the report.
pub const CSV_HEADER: [&str; 6] = [
    "Email Address",
    "Author Score",
    "In-Degree",
    "Out-Degree",
    "Clustering Coeff",
    "Module Flow",
];

/// One report row.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub email: String,
    pub score: f64,
    pub in_degree: usize,
    pub out_degree: usize,
    pub clustering_coeff: f64,
    /// `None` when the author has no line in the tree file.
    pub module_flow: Option<f64>,
}

impl AuthorRecord {
    fn to_fields(&self) -> [String; 6] {
        [
            self.email.clone(),
            self.score.to_string(),
            self.in_degree.to_string(),
            self.out_degree.to_string(),
            self.clustering_coeff.to_string(),
            self.module_flow.map(|f| f.to_string()).unwrap_or_default(),
        ]
    }
}

/// Joins graph statistics with tree module flow.
pub struct TreeJoiner<'a> {
    top: &'a TopAuthorSet,
    metrics: AuthorMetrics,
    /// Top authors that are graph nodes and so must appear in the tree.
    clustered: HashSet<String>,
    policy: MissingFlowPolicy,
}

impl<'a> TreeJoiner<'a> {
    #[must_use]
    pub fn new(top: &'a TopAuthorSet, graph: &AuthorGraph, policy: MissingFlowPolicy) -> Self {
        let clustered = top
            .iter()
            .map(|(email, _)| email)
            .filter(|email| graph.contains_author(email))
            .map(str::to_string)
            .collect();
        Self {
            top,
            metrics: AuthorMetrics::compute(graph),
            clustered,
            policy,
        }
    }

    /// Records for every top author with no module flow yet.
    #[must_use]
    pub fn seed(&self) -> Vec<AuthorRecord> {
        self.top
            .iter()
            .map(|(email, score)| {
                let stats = self.metrics.get(email);
                AuthorRecord {
                    email: email.to_string(),
                    score,
                    in_degree: stats.in_degree,
                    out_degree: stats.out_degree,
                    clustering_coeff: stats.clustering,
                    module_flow: None,
                }
            })
            .collect()
    }

    /// Attach flows from parsed tree lines.
    ///
    /// # Errors
    ///
    /// - [`DetectError::Parse`] for a malformed line or an author listed twice.
    /// - [`DetectError::MissingData`] when the policy is
    ///   [`MissingFlowPolicy::Error`] and a top author that is a graph node
    ///   has no tree line, or the tree lists an author outside the top set.
    pub fn join<I>(&self, lines: I) -> Result<Vec<AuthorRecord>>
    where
        I: IntoIterator<Item = Result<TreeLine>>,
    {
        let mut records = self.seed();
        let index: HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.email.clone(), i))
            .collect();
        let mut unknown = BTreeSet::new();

        for line in lines {
            let line = line?;
            let Some(&i) = index.get(&line.name) else {
                unknown.insert(line.name);
                continue;
            };
            let record = &mut records[i];
            if record.module_flow.is_some() {
                return Err(ParseError::tree(line.line, &line.raw, "author listed twice").into());
            }
            record.module_flow = Some(line.flow);
        }

        let missing: Vec<String> = records
            .iter()
            .filter(|r| r.module_flow.is_none() && self.clustered.contains(&r.email))
            .map(|r| r.email.clone())
            .collect();
        let isolated = records.len() - self.clustered.len();
        if isolated > 0 {
            debug!(isolated, "top authors outside the graph have no module flow");
        }
        let gaps = MissingDataError {
            missing_from_tree: missing,
            unknown_in_tree: unknown.into_iter().collect(),
        };

        if !gaps.is_empty() {
            match self.policy {
                MissingFlowPolicy::Error => return Err(gaps.into()),
                MissingFlowPolicy::Null => {
                    if !gaps.unknown_in_tree.is_empty() {
                        warn!(
                            count = gaps.unknown_in_tree.len(),
                            "tree lists authors outside the top set; skipped"
                        );
                    }
                    if !gaps.missing_from_tree.is_empty() {
                        warn!(
                            count = gaps.missing_from_tree.len(),
                            "top authors missing from tree; module flow left empty"
                        );
                    }
                }
            }
        }

        debug!(records = records.len(), "tree joined");
        Ok(records)
    }

    /// Stream `tree` from disk and join it.
    ///
    /// # Errors
    ///
    /// See [`TreeJoiner::join`]; also [`DetectError::Read`] if the file
    /// cannot be opened or read.
    #[instrument(skip(self))]
    pub fn join_file(&self, tree: &Path) -> Result<Vec<AuthorRecord>> {
        info!("Parsing {}...", tree.display());
        self.join(TreeReader::open(tree)?)
    }
}

/// Write the report rows, header first.
///
/// # Errors
///
/// Returns [`DetectError::Csv`] if writing fails.
pub fn write_csv<W: Write>(records: &[AuthorRecord], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(record.to_fields())?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the report to `path` via a temporary sibling file.
///
/// # Errors
///
/// Returns [`DetectError::Io`] or [`DetectError::Csv`]; on failure no file
/// is left at `path`.
#[instrument(skip(records), fields(rows = records.len()))]
pub fn write_csv_file(records: &[AuthorRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DetectError::io(parent, e))?;
    }

    let tmp = path.with_extension("csv.tmp");
    let written = fs::File::create(&tmp)
        .map_err(|e| DetectError::io(&tmp, e))
        .and_then(|file| write_csv(records, std::io::BufWriter::new(file)));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    fs::rename(&tmp, path).map_err(|e| DetectError::io(path, e))?;
    info!("Authors data written to {}.", path.display());
    Ok(())
}
