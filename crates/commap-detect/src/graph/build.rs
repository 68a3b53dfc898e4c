//! Graph construction from a message corpus.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A wrote to B" (B was in `To` or `Cc` of a message
//! from A). Self-addressed messages produce a self-loop.
//!
//! ## Membership
//!
//! Only messages whose sender is a member contribute, and only recipients
//! that are members get an edge. Nodes are created lazily as edge
//! endpoints, so members that never corresponded with another member are
//! not in the graph.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use commap_core::corpus::Corpus;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

use super::weighting::WeightingPolicy;

// ---------------------------------------------------------------------------
// AuthorGraph
// ---------------------------------------------------------------------------

/// A directed, weighted correspondence graph between authors.
#[derive(Debug, Clone, Default)]
pub struct AuthorGraph {
    /// Nodes = author addresses, edge weight = correspondence intensity.
    pub graph: DiGraph<String, f64>,
    /// Mapping from address to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
}

impl AuthorGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, author: &str) -> Option<NodeIndex> {
        self.node_map.get(author).copied()
    }

    #[must_use]
    pub fn author(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    #[must_use]
    pub fn contains_author(&self, author: &str) -> bool {
        self.node_map.contains_key(author)
    }

    /// Authors in node-index order.
    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Weight of the `from → to` edge, if present.
    #[must_use]
    pub fn edge_weight(&self, from: &str, to: &str) -> Option<f64> {
        let a = self.node_index(from)?;
        let b = self.node_index(to)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).copied()
    }

    /// `(from, to, weight)` for every edge, in edge-index order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.graph.raw_edges().iter().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                edge.weight,
            )
        })
    }

    /// Return the node for `author`, adding it if absent.
    pub fn ensure_node(&mut self, author: &str) -> NodeIndex {
        if let Some(idx) = self.node_map.get(author) {
            return *idx;
        }
        let idx = self.graph.add_node(author.to_string());
        self.node_map.insert(author.to_string(), idx);
        idx
    }

    /// Set the weight of `from → to`, creating nodes and edge as needed.
    pub fn set_edge(&mut self, from: &str, to: &str, weight: f64) {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        self.graph.update_edge(a, b, weight);
    }

    /// Record one observation of `from → to` under `policy`.
    fn observe(&mut self, from: &str, to: &str, policy: &dyn WeightingPolicy) {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        match self.graph.find_edge(a, b) {
            Some(edge) => {
                let weight = &mut self.graph[edge];
                *weight = policy.reinforce(*weight);
            }
            None => {
                self.graph.add_edge(a, b, policy.initial());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

/// Builds an [`AuthorGraph`] restricted to a member set.
pub struct GraphBuilder<'a> {
    members: &'a HashSet<String>,
    policy: &'a dyn WeightingPolicy,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(members: &'a HashSet<String>, policy: &'a dyn WeightingPolicy) -> Self {
        Self { members, policy }
    }

    /// Build the member-restricted graph from `corpus`.
    #[instrument(skip_all, fields(members = self.members.len(), weighting = %self.policy.kind()))]
    #[must_use]
    pub fn build(&self, corpus: &Corpus) -> AuthorGraph {
        let mut graph = AuthorGraph::new();

        for message in corpus.messages() {
            if !self.members.contains(&message.from) {
                continue;
            }
            for recipient in message.recipients() {
                if self.members.contains(recipient) {
                    graph.observe(&message.from, recipient, self.policy);
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "author graph built"
        );
        graph
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
