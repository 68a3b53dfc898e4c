//! Author correspondence graph.
//!
//! # Pipeline
//!
//! ```text
//! Corpus + member set
//!        ↓  build::GraphBuilder::build()
//! AuthorGraph (DiGraph<String, f64>, weights per WeightingPolicy)
//!        ↓  metrics::AuthorMetrics::compute()
//! in-degree / out-degree / clustering coefficient per author
//! ```
//!
//! The same builder serves the top-level graph (top authors, rescale
//! weighting) and the per-module subgraphs (module members, increment
//! weighting); only the member set and the policy differ.

pub mod build;
pub mod metrics;
pub mod weighting;

pub use build::{AuthorGraph, GraphBuilder};
pub use metrics::AuthorMetrics;
pub use weighting::{IncrementWeighting, RescaleWeighting, WeightingPolicy, policy_for};
