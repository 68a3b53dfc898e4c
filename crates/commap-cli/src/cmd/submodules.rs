//! `commap submodules`: re-run Infomap inside every module of a tree.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use commap_core::config::{ProjectConfig, WeightingKind};
use commap_core::timing::timed;
use commap_detect::graph::policy_for;
use commap_detect::submodule::RecursionReport;
use commap_detect::{DetectOptions, SubmoduleRecurser};

use super::detect::display;
use super::InfomapArgs;
use crate::output::{OutputMode, pretty_kv, render};

/// Arguments for `commap submodules`.
#[derive(Args, Debug, Clone)]
pub struct SubmodulesArgs {
    /// JSON message corpus.
    #[arg(value_name = "CORPUS")]
    pub corpus: PathBuf,

    #[command(flatten)]
    pub infomap: InfomapArgs,

    /// Infomap tree file to partition [default: <work-dir>/output/author_graph.tree].
    #[arg(long, value_name = "PATH")]
    pub tree: Option<PathBuf>,

    /// Directory of the top-level run; receives `submodule_<k>.net` and
    /// `output_submodule<k>/`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Module levels to descend.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Edge weighting rule for module subgraphs.
    #[arg(long, value_name = "RULE")]
    pub weighting: Option<WeightingKind>,
}

/// Execute `commap submodules`.
pub fn run_submodules(
    args: &SubmodulesArgs,
    config: &ProjectConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let corpus_args = super::CorpusArgs {
        corpus: args.corpus.clone(),
        ..Default::default()
    };
    let corpus = corpus_args.load()?;
    let runner = args.infomap.runner(config);
    let weighting = args.weighting.unwrap_or(config.graph.submodule_weighting);

    let recurser = SubmoduleRecurser::new(&corpus, &runner, &args.work_dir)
        .with_flags(args.infomap.flags(config))
        .with_weighting(policy_for(weighting))
        .with_max_depth(args.max_depth.unwrap_or(config.submodules.max_depth));
    let tree = args
        .tree
        .clone()
        .unwrap_or_else(|| DetectOptions::new(&args.work_dir).tree_path());
    let report = timed("submodules", || recurser.run(&tree))?;

    render(output, &report, |r, w| render_recursion_human(r, w))
}

pub(crate) fn render_recursion_human(report: &RecursionReport, w: &mut dyn Write) -> std::io::Result<()> {
    for module in &report.processed {
        pretty_kv(
            w,
            &format!("module {}", module.module),
            format!(
                "{} authors, {} edges -> {}",
                module.members,
                module.edges,
                display(&module.tree)
            ),
        )?;
    }
    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report.skipped.iter().map(ToString::to_string).collect();
        pretty_kv(w, "skipped", skipped.join(", "))?;
    }
    writeln!(
        w,
        "{} module(s) clustered, {} skipped",
        report.processed.len(),
        report.skipped.len()
    )
}
