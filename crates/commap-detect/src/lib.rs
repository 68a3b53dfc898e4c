#![forbid(unsafe_code)]
//! commap-detect library.
//!
//! Prepares Infomap input from a message corpus and consumes its output:
//!
//! - [`graph`]: correspondence graph construction, weighting and metrics.
//! - [`pajek`]: `.net` writer and reader.
//! - [`tree`]: streaming `.tree` parser.
//! - [`runner`]: the clustering tool boundary.
//! - [`report`]: per-author join and CSV report.
//! - [`submodule`]: per-module re-clustering.
//! - [`pipeline`]: the top-level detect and report flows.
//!
//! # Conventions
//!
//! - **Errors**: [`DetectError`] via `thiserror`; one variant per failure class.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod error;
pub mod graph;
pub mod pajek;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod submodule;
pub mod tree;

pub use error::{DetectError, ExternalToolError, MissingDataError, ParseError, Result, ToolFailure};
pub use graph::{AuthorGraph, AuthorMetrics, GraphBuilder};
pub use pipeline::{DetectOptions, DetectOutcome, detect, report_from_tree};
pub use report::{AuthorRecord, TreeJoiner};
pub use runner::{ClusteringRunner, InfomapRunner, RunStatus};
pub use submodule::{RecursionReport, SubmoduleRecurser};
pub use tree::{ModulePath, TreeLine, TreeReader};
