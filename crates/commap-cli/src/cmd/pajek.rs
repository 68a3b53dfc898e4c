//! `commap pajek`: write the top-author graph without running Infomap.

use std::path::PathBuf;

use clap::Args;
use commap_core::config::ProjectConfig;
use commap_core::ranking::TopAuthorSet;
use commap_core::timing::timed;
use commap_detect::GraphBuilder;
use commap_detect::graph::policy_for;
use commap_detect::pajek::write_pajek_file;
use commap_detect::pipeline::GRAPH_FILE_NAME;
use serde::Serialize;

use super::CorpusArgs;
use super::detect::display;
use crate::output::{OutputMode, pretty_kv, render};

/// Arguments for `commap pajek`.
#[derive(Args, Debug, Clone)]
pub struct PajekArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Destination `.net` file.
    #[arg(long, value_name = "PATH", default_value = GRAPH_FILE_NAME)]
    pub out: PathBuf,
}

#[derive(Debug, Serialize)]
struct PajekSummary {
    top_authors: usize,
    nodes: usize,
    edges: usize,
    network: PathBuf,
}

/// Execute `commap pajek`.
pub fn run_pajek(args: &PajekArgs, config: &ProjectConfig, output: OutputMode) -> anyhow::Result<()> {
    let corpus = args.corpus.load()?;
    let ranking = super::ranking(config);
    let top = timed("rank", || {
        TopAuthorSet::select(&corpus, &ranking, args.corpus.top_n(config))
    });
    let policy = policy_for(args.corpus.weighting(config));
    let graph = timed("graph", || GraphBuilder::new(top.members(), policy).build(&corpus));
    timed("pajek", || write_pajek_file(&graph, &args.out))?;

    let summary = PajekSummary {
        top_authors: top.len(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        network: args.out.clone(),
    };
    render(output, &summary, |s, w| {
        pretty_kv(w, "top authors", s.top_authors.to_string())?;
        pretty_kv(w, "graph", format!("{} nodes, {} edges", s.nodes, s.edges))?;
        pretty_kv(w, "network", display(&s.network))
    })
}
