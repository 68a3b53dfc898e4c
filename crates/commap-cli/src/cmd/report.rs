//! `commap report`: join an existing Infomap tree into the author report.

use std::path::PathBuf;

use clap::Args;
use commap_core::config::{MissingFlowPolicy, ProjectConfig};
use commap_detect::report_from_tree;

use super::detect::render_outcome_human;
use super::CorpusArgs;
use crate::output::{OutputMode, render};

/// Arguments for `commap report`.
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Directory a previous `commap detect` ran in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Infomap tree file [default: <work-dir>/output/author_graph.tree].
    #[arg(long, value_name = "PATH")]
    pub tree: Option<PathBuf>,

    /// Report destination [default: <work-dir>/top_authors_data.csv].
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// What to do with top authors missing from the tree.
    #[arg(long, value_name = "POLICY")]
    pub missing_flow: Option<MissingFlowPolicy>,
}

/// Execute `commap report`.
pub fn run_report(args: &ReportArgs, config: &ProjectConfig, output: OutputMode) -> anyhow::Result<()> {
    let corpus = args.corpus.load()?;
    let ranking = super::ranking(config);

    let mut opts = super::detect_options(&args.corpus, args.missing_flow, &args.work_dir, config);
    opts.report_path.clone_from(&args.out);
    let tree = args.tree.clone().unwrap_or_else(|| opts.tree_path());

    let outcome = report_from_tree(&corpus, &ranking, &tree, &opts)?;
    render(output, &outcome, |o, w| render_outcome_human(o, w))
}
