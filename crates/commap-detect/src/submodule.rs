//! Re-running detection inside each detected module.
//!
//! A tree file lists nodes grouped by their leading module index. The
//! recurser streams it, closes a module whenever the index advances, and
//! for every closed module:
//!
//! 1. builds the corpus graph restricted to that module's authors,
//! 2. writes it to `submodule_<path>.net` in the work directory,
//! 3. runs the clustering tool into `output_submodule<path>/`.
//!
//! With `max_depth > 1` the tree each run produces is queued and handled
//! the same way, extending the module path (`submodule_1_2.net`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use commap_core::corpus::Corpus;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ParseError, Result};
use crate::graph::{GraphBuilder, IncrementWeighting, WeightingPolicy};
use crate::pajek::write_pajek_file;
use crate::runner::{ClusteringJob, ClusteringRunner};
use crate::tree::{ModulePath, TreeLine, TreeReader};

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Authors of one top-level module of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMembers {
    /// 1-based module index.
    pub index: u32,
    pub authors: HashSet<String>,
}

/// Groups consecutive tree lines by leading module index.
///
/// Indices must start at 1 and advance by exactly one at each boundary.
#[derive(Debug, Default)]
pub struct ModulePartitioner {
    open: Option<ModuleMembers>,
}

impl ModulePartitioner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line. Returns the previous module when this line
    /// starts a new one.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the line's module index is not the
    /// current one or its successor (or, for the first line, not 1).
    pub fn push(&mut self, line: TreeLine) -> std::result::Result<Option<ModuleMembers>, ParseError> {
        let index = line.module();
        if let Some(open) = self.open.as_mut().filter(|m| m.index == index) {
            open.authors.insert(line.name);
            return Ok(None);
        }

        let expected = self.open.as_ref().map_or(1, |m| m.index + 1);
        if index != expected {
            let reason = match &self.open {
                None => format!("first module index is {index}, expected 1"),
                Some(open) => format!(
                    "module index {index} follows {}, expected {} or {expected}",
                    open.index, open.index
                ),
            };
            return Err(ParseError::tree(line.line, &line.raw, reason));
        }

        let started = ModuleMembers {
            index,
            authors: HashSet::from([line.name]),
        };
        Ok(self.open.replace(started))
    }

    /// Close the last open module at end of input.
    #[must_use]
    pub fn finish(self) -> Option<ModuleMembers> {
        self.open
    }
}

/// Partition a whole tree into modules.
///
/// # Errors
///
/// Propagates tree read errors and index ordering violations.
pub fn partition_modules<I>(lines: I) -> Result<Vec<ModuleMembers>>
where
    I: IntoIterator<Item = Result<TreeLine>>,
{
    let mut partitioner = ModulePartitioner::new();
    let mut modules = Vec::new();
    for line in lines {
        if let Some(closed) = partitioner.push(line?)? {
            modules.push(closed);
        }
    }
    modules.extend(partitioner.finish());
    Ok(modules)
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Files produced for one processed module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleArtifacts {
    pub module: ModulePath,
    pub members: usize,
    pub edges: usize,
    pub network: PathBuf,
    pub output_dir: PathBuf,
    pub tree: PathBuf,
}

/// Outcome of a recursion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecursionReport {
    /// Modules that were clustered, in processing order.
    pub processed: Vec<ModuleArtifacts>,
    /// Modules whose subgraph had no edges.
    pub skipped: Vec<ModulePath>,
}

// ---------------------------------------------------------------------------
// SubmoduleRecurser
// ---------------------------------------------------------------------------

/// Runs the clustering tool once per module of a tree.
pub struct SubmoduleRecurser<'a> {
    corpus: &'a Corpus,
    runner: &'a dyn ClusteringRunner,
    work_dir: PathBuf,
    flags: Vec<String>,
    policy: &'a dyn WeightingPolicy,
    max_depth: usize,
}

impl<'a> SubmoduleRecurser<'a> {
    /// Single-level recursion with increment weighting and no tool flags.
    pub fn new(corpus: &'a Corpus, runner: &'a dyn ClusteringRunner, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus,
            runner,
            work_dir: work_dir.into(),
            flags: Vec::new(),
            policy: &IncrementWeighting,
            max_depth: 1,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_weighting(mut self, policy: &'a dyn WeightingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// How many module levels to descend. `0` does nothing.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Network file for `module`: `<work_dir>/submodule_<suffix>.net`.
    #[must_use]
    pub fn network_path(&self, module: &ModulePath) -> PathBuf {
        self.work_dir
            .join(format!("submodule_{}.net", module.file_suffix()))
    }

    /// Output directory for `module`: `<work_dir>/output_submodule<suffix>`.
    #[must_use]
    pub fn output_dir(&self, module: &ModulePath) -> PathBuf {
        self.work_dir
            .join(format!("output_submodule{}", module.file_suffix()))
    }

    /// Partition `tree` and cluster every module, descending up to the
    /// configured depth.
    ///
    /// # Errors
    ///
    /// Stops at the first failure: a malformed or out-of-order tree
    /// ([`crate::DetectError::Parse`]), an unreadable tree
    /// ([`crate::DetectError::Read`]), a write failure
    /// ([`crate::DetectError::Io`]) or a failed tool run
    /// ([`crate::DetectError::ExternalTool`]).
    #[instrument(skip(self), fields(max_depth = self.max_depth, weighting = %self.policy.kind()))]
    pub fn run(&self, tree: &Path) -> Result<RecursionReport> {
        let mut report = RecursionReport::default();
        let mut pending: Vec<(ModulePath, PathBuf)> = Vec::new();
        if self.max_depth > 0 {
            pending.push((ModulePath::root(), tree.to_path_buf()));
        }

        while let Some((parent, tree)) = pending.pop() {
            info!("Partitioning {} ({})", tree.display(), parent);
            let mut partitioner = ModulePartitioner::new();
            let mut children = Vec::new();

            for line in TreeReader::open(&tree)? {
                if let Some(closed) = partitioner.push(line?)? {
                    children.extend(self.process(&parent, closed, &mut report)?);
                }
            }
            if let Some(last) = partitioner.finish() {
                children.extend(self.process(&parent, last, &mut report)?);
            }

            if parent.depth() + 1 < self.max_depth {
                pending.extend(children.into_iter().rev());
            }
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "submodule recursion finished"
        );
        Ok(report)
    }

    fn process(
        &self,
        parent: &ModulePath,
        members: ModuleMembers,
        report: &mut RecursionReport,
    ) -> Result<Option<(ModulePath, PathBuf)>> {
        let module = parent.child(members.index);
        let graph = GraphBuilder::new(&members.authors, self.policy).build(self.corpus);
        if graph.edge_count() == 0 {
            warn!(
                module = %module,
                authors = members.authors.len(),
                "module has no internal correspondence; skipped"
            );
            report.skipped.push(module);
            return Ok(None);
        }

        info!(
            "Processing module {} ({} authors, {} edges)",
            module,
            members.authors.len(),
            graph.edge_count()
        );
        let network = self.network_path(&module);
        write_pajek_file(&graph, &network)?;

        let output_dir = self.output_dir(&module);
        let job = ClusteringJob {
            module: &module,
            input: &network,
            output_dir: &output_dir,
            flags: &self.flags,
        };
        let tree = job.execute(self.runner)?;
        debug!(module = %module, tree = %tree.display(), "module clustered");

        report.processed.push(ModuleArtifacts {
            module: module.clone(),
            members: members.authors.len(),
            edges: graph.edge_count(),
            network,
            output_dir,
            tree: tree.clone(),
        });
        Ok(Some((module, tree)))
    }
}
