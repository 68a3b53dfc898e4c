pub mod detect;
pub mod pajek;
pub mod report;
pub mod submodules;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use commap_core::config::{MissingFlowPolicy, ProjectConfig, WeightingKind};
use commap_core::corpus::Corpus;
use commap_core::ranking::ActivityRanking;
use commap_core::timing::timed;
use commap_detect::{DetectOptions, InfomapRunner};

/// Corpus and ranking flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct CorpusArgs {
    /// JSON message corpus: `{ "<id>": { "From", "To", "Cc" } }`.
    #[arg(value_name = "CORPUS")]
    pub corpus: PathBuf,

    /// Number of top-ranked authors kept as graph nodes.
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Edge weighting rule for repeated correspondence.
    #[arg(long, value_name = "RULE")]
    pub weighting: Option<WeightingKind>,
}

impl CorpusArgs {
    pub fn load(&self) -> anyhow::Result<Corpus> {
        let corpus = timed("load", || Corpus::load(&self.corpus))
            .with_context(|| format!("loading corpus {}", self.corpus.display()))?;
        tracing::info!("Loaded {} messages", corpus.len());
        Ok(corpus)
    }

    pub fn top_n(&self, config: &ProjectConfig) -> usize {
        self.top_n.unwrap_or(config.ranking.top_n)
    }

    pub fn weighting(&self, config: &ProjectConfig) -> WeightingKind {
        self.weighting.unwrap_or(config.graph.weighting)
    }
}

/// Infomap invocation flags.
#[derive(Args, Debug, Clone, Default)]
pub struct InfomapArgs {
    /// Path to the Infomap binary.
    #[arg(long, value_name = "PATH")]
    pub infomap: Option<PathBuf>,

    /// Argument passed to Infomap after the input and output paths.
    /// Repeat to pass several; replaces the configured flags.
    #[arg(long = "infomap-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub infomap_args: Vec<String>,
}

impl InfomapArgs {
    pub fn runner(&self, config: &ProjectConfig) -> InfomapRunner {
        InfomapRunner::new(
            self.infomap
                .clone()
                .unwrap_or_else(|| config.infomap.binary.clone()),
        )
    }

    pub fn flags(&self, config: &ProjectConfig) -> Vec<String> {
        if self.infomap_args.is_empty() {
            config.infomap.flags.clone()
        } else {
            self.infomap_args.clone()
        }
    }
}

pub fn ranking(config: &ProjectConfig) -> ActivityRanking {
    ActivityRanking {
        active_score: config.ranking.active_score,
        passive_score: config.ranking.passive_score,
    }
}

pub fn detect_options(
    corpus: &CorpusArgs,
    missing_flow: Option<MissingFlowPolicy>,
    work_dir: &Path,
    config: &ProjectConfig,
) -> DetectOptions {
    let mut opts = DetectOptions::new(work_dir);
    opts.top_n = corpus.top_n(config);
    opts.weighting = corpus.weighting(config);
    opts.missing_flow = missing_flow.unwrap_or(config.report.missing_flow);
    opts
}
