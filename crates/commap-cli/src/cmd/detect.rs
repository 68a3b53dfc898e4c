//! `commap detect`: graph, Infomap run and author report in one pass.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use commap_core::config::{MissingFlowPolicy, ProjectConfig};
use commap_core::timing::timed;
use commap_detect::graph::policy_for;
use commap_detect::submodule::RecursionReport;
use commap_detect::{DetectOutcome, SubmoduleRecurser, detect};
use serde::Serialize;

use super::{CorpusArgs, InfomapArgs};
use crate::cmd::submodules::render_recursion_human;
use crate::output::{OutputMode, pretty_kv, render};

/// Arguments for `commap detect`.
#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub infomap: InfomapArgs,

    /// Directory for `author_graph.net` and Infomap's `output/`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Report path (default: `<work-dir>/top_authors_data.csv`).
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// What to do with top authors missing from the tree.
    #[arg(long, value_name = "POLICY")]
    pub missing_flow: Option<MissingFlowPolicy>,

    /// Re-run Infomap inside each detected module afterwards.
    #[arg(long)]
    pub submodules: bool,
}

#[derive(Debug, Serialize)]
struct DetectPayload {
    #[serde(flatten)]
    outcome: DetectOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    submodules: Option<RecursionReport>,
}

/// Execute `commap detect`.
pub fn run_detect(args: &DetectArgs, config: &ProjectConfig, output: OutputMode) -> anyhow::Result<()> {
    let corpus = args.corpus.load()?;
    let ranking = super::ranking(config);
    let runner = args.infomap.runner(config);

    let mut opts = super::detect_options(&args.corpus, args.missing_flow, &args.work_dir, config);
    opts.flags = args.infomap.flags(config);
    opts.report_path.clone_from(&args.out);

    let outcome = detect(&corpus, &ranking, &runner, &opts)?;

    let submodules = if args.submodules {
        let recurser = SubmoduleRecurser::new(&corpus, &runner, &args.work_dir)
            .with_flags(opts.flags.clone())
            .with_weighting(policy_for(config.graph.submodule_weighting))
            .with_max_depth(config.submodules.max_depth);
        Some(timed("submodules", || recurser.run(&outcome.tree))?)
    } else {
        None
    };

    let payload = DetectPayload {
        outcome,
        submodules,
    };
    render(output, &payload, |p, w| render_detect_human(p, w))
}

fn render_detect_human(payload: &DetectPayload, w: &mut dyn Write) -> std::io::Result<()> {
    render_outcome_human(&payload.outcome, w)?;
    if let Some(report) = &payload.submodules {
        render_recursion_human(report, w)?;
    }
    Ok(())
}

pub(crate) fn render_outcome_human(outcome: &DetectOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_kv(w, "top authors", outcome.top_authors.to_string())?;
    pretty_kv(
        w,
        "graph",
        format!("{} nodes, {} edges", outcome.nodes, outcome.edges),
    )?;
    if outcome.network.is_file() {
        pretty_kv(w, "network", display(&outcome.network))?;
    }
    pretty_kv(w, "tree", display(&outcome.tree))?;
    pretty_kv(
        w,
        "report",
        format!("{} ({} rows)", display(&outcome.report), outcome.rows),
    )?;
    if outcome.missing_flow > 0 {
        pretty_kv(w, "missing flow", outcome.missing_flow.to_string())?;
    }
    Ok(())
}

pub(crate) fn display(path: &Path) -> String {
    path.display().to_string()
}
