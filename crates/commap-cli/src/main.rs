#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commap_core::config::{self, ProjectConfig};
use commap_core::timing;
use output::{CliError, ConfigError, OutputMode, render_error};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "commap: Infomap communities in email correspondence",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit per-stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (default: ./commap.toml if present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    fn load_config(&self) -> anyhow::Result<ProjectConfig> {
        let loaded = match &self.config {
            Some(path) => config::load_config_file(path, true),
            None => config::load_project_config(&env::current_dir()?),
        };
        loaded.map_err(|err| anyhow::Error::new(ConfigError(err)))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Build the graph, run Infomap and write the author report",
        long_about = "Rank authors, build the top-author correspondence graph, write it as \
                      author_graph.net, run Infomap on it and join the resulting tree into \
                      top_authors_data.csv.",
        after_help = "EXAMPLES:\n    # Full pipeline in the current directory\n    commap detect corpus.json\n\n    # Keep 50 authors and recurse into modules\n    commap detect corpus.json --top-n 50 --submodules\n\n    # Emit machine-readable output\n    commap detect corpus.json --json"
    )]
    Detect(cmd::detect::DetectArgs),

    #[command(
        about = "Join an existing Infomap tree into the author report",
        after_help = "EXAMPLES:\n    # Use the default tree location\n    commap report corpus.json\n\n    # Tolerate authors missing from the tree\n    commap report corpus.json --tree out/g.tree --missing-flow null"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        about = "Re-run Infomap inside each module of a tree",
        after_help = "EXAMPLES:\n    # One level of submodules over ./output/author_graph.tree\n    commap submodules corpus.json\n\n    # Two levels\n    commap submodules corpus.json --max-depth 2"
    )]
    Submodules(cmd::submodules::SubmodulesArgs),

    #[command(
        about = "Write the top-author graph in Pajek format",
        after_help = "EXAMPLES:\n    # Write author_graph.net\n    commap pajek corpus.json\n\n    # Increment weighting into a custom path\n    commap pajek corpus.json --weighting increment --out graphs/g.net"
    )]
    Pajek(cmd::pajek::PajekArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("COMMAP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "commap=debug,info"
        } else {
            "commap=info,warn"
        })
    });

    let format = env::var("COMMAP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    let output = cli.output_mode();

    match &cli.command {
        Commands::Detect(args) => timing::timed("cmd.detect", || {
            cmd::detect::run_detect(args, &config, output)
        }),
        Commands::Report(args) => timing::timed("cmd.report", || {
            cmd::report::run_report(args, &config, output)
        }),
        Commands::Submodules(args) => timing::timed("cmd.submodules", || {
            cmd::submodules::run_submodules(args, &config, output)
        }),
        Commands::Pajek(args) => {
            timing::timed("cmd.pajek", || cmd::pajek::run_pajek(args, &config, output))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let result = run(&cli);

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&report.to_json()).unwrap_or_default()
            );
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            if render_error(cli.output_mode(), &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
