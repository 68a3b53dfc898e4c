//! End-to-end detection: rank, build, write, cluster, join.

use std::path::{Path, PathBuf};

use commap_core::config::{MissingFlowPolicy, WeightingKind};
use commap_core::corpus::Corpus;
use commap_core::ranking::{AuthorRanking, DEFAULT_TOP_N, TopAuthorSet};
use commap_core::timing::timed;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::graph::{GraphBuilder, policy_for};
use crate::pajek::write_pajek_file;
use crate::report::{TreeJoiner, write_csv_file};
use crate::runner::{ClusteringJob, ClusteringRunner};
use crate::tree::ModulePath;

/// Network file name of the top-level graph.
pub const GRAPH_FILE_NAME: &str = "author_graph.net";
/// Directory the top-level clustering run writes into.
pub const OUTPUT_DIR_NAME: &str = "output";
/// Tree file the top-level clustering run produces.
pub const TREE_FILE_NAME: &str = "author_graph.tree";
/// Default report file name.
pub const REPORT_FILE_NAME: &str = "top_authors_data.csv";

/// Inputs of a detection run other than the corpus and collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectOptions {
    pub top_n: usize,
    pub weighting: WeightingKind,
    pub flags: Vec<String>,
    pub missing_flow: MissingFlowPolicy,
    /// Receives `author_graph.net` and `output/`.
    pub work_dir: PathBuf,
    /// Report destination; defaults to `<work_dir>/top_authors_data.csv`.
    pub report_path: Option<PathBuf>,
}

impl DetectOptions {
    #[must_use]
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            weighting: WeightingKind::Rescale,
            flags: Vec::new(),
            missing_flow: MissingFlowPolicy::Error,
            work_dir: work_dir.into(),
            report_path: None,
        }
    }

    #[must_use]
    pub fn network_path(&self) -> PathBuf {
        self.work_dir.join(GRAPH_FILE_NAME)
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.work_dir.join(OUTPUT_DIR_NAME)
    }

    /// Where the top-level clustering run leaves its tree.
    #[must_use]
    pub fn tree_path(&self) -> PathBuf {
        self.output_dir().join(TREE_FILE_NAME)
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .clone()
            .unwrap_or_else(|| self.work_dir.join(REPORT_FILE_NAME))
    }
}

/// Summary of a finished detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectOutcome {
    pub top_authors: usize,
    pub nodes: usize,
    pub edges: usize,
    pub network: PathBuf,
    pub tree: PathBuf,
    pub report: PathBuf,
    pub rows: usize,
    /// Rows whose module flow is empty.
    pub missing_flow: usize,
}

/// Run the whole pipeline over `corpus`.
///
/// # Errors
///
/// Any [`crate::DetectError`] from graph writing, the clustering run, the
/// tree join or the report write. Nothing is written to the report path
/// unless every earlier step succeeded.
#[instrument(skip_all, fields(messages = corpus.len(), top_n = opts.top_n))]
pub fn detect(
    corpus: &Corpus,
    ranking: &dyn AuthorRanking,
    runner: &dyn ClusteringRunner,
    opts: &DetectOptions,
) -> Result<DetectOutcome> {
    let top = timed("rank", || TopAuthorSet::select(corpus, ranking, opts.top_n));
    info!("Selected {} top authors", top.len());

    let policy = policy_for(opts.weighting);
    let graph = timed("graph", || GraphBuilder::new(top.members(), policy).build(corpus));

    let network = opts.network_path();
    timed("pajek", || write_pajek_file(&graph, &network))?;

    let output_dir = opts.output_dir();
    let module = ModulePath::root();
    let job = ClusteringJob {
        module: &module,
        input: &network,
        output_dir: &output_dir,
        flags: &opts.flags,
    };
    let tree = timed("infomap", || job.execute(runner))?;

    let records = timed("join", || {
        TreeJoiner::new(&top, &graph, opts.missing_flow).join_file(&tree)
    })?;
    let report = opts.report_path();
    timed("report", || write_csv_file(&records, &report))?;

    Ok(DetectOutcome {
        top_authors: top.len(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        network,
        tree,
        report,
        rows: records.len(),
        missing_flow: records.iter().filter(|r| r.module_flow.is_none()).count(),
    })
}

/// Join an existing tree file against a freshly built graph and write the
/// report. Used when the clustering run happened elsewhere.
///
/// # Errors
///
/// See [`TreeJoiner::join_file`] and [`write_csv_file`].
#[instrument(skip(corpus, ranking, opts))]
pub fn report_from_tree(
    corpus: &Corpus,
    ranking: &dyn AuthorRanking,
    tree: &Path,
    opts: &DetectOptions,
) -> Result<DetectOutcome> {
    let top = timed("rank", || TopAuthorSet::select(corpus, ranking, opts.top_n));
    let policy = policy_for(opts.weighting);
    let graph = timed("graph", || GraphBuilder::new(top.members(), policy).build(corpus));

    let records = timed("join", || {
        TreeJoiner::new(&top, &graph, opts.missing_flow).join_file(tree)
    })?;
    let report = opts.report_path();
    timed("report", || write_csv_file(&records, &report))?;

    Ok(DetectOutcome {
        top_authors: top.len(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        network: opts.network_path(),
        tree: tree.to_path_buf(),
        report,
        rows: records.len(),
        missing_flow: records.iter().filter(|r| r.module_flow.is_none()).count(),
    })
}
