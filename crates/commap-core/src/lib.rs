#![forbid(unsafe_code)]
//! commap-core library.
//!
//! Message corpus loading, author ranking, configuration and the stable
//! error codes shared by the detection engine and the CLI.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module; `anyhow::Result` at
//!   configuration edges.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod corpus;
pub mod error;
pub mod ranking;
pub mod timing;

pub use corpus::{Corpus, CorpusError, Message};
pub use ranking::{ActivityRanking, AuthorRanking, TopAuthorSet};
