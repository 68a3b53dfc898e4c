//! Per-author graph statistics for the report.
//!
//! - **In-/out-degree** on the directed graph. A self-loop counts once in
//!   each direction.
//! - **Clustering coefficient** on the undirected projection, unweighted:
//!   `2·T(v) / (k(v)·(k(v) − 1))` where `k(v)` is the number of distinct
//!   neighbours other than `v` and `T(v)` the number of links among them.
//!   Nodes with fewer than two neighbours score 0.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::IntoNodeIdentifiers;

use super::build::AuthorGraph;

/// Statistics for one author.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AuthorStats {
    pub in_degree: usize,
    pub out_degree: usize,
    pub clustering: f64,
}

/// Statistics for every node of an [`AuthorGraph`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorMetrics {
    stats: HashMap<String, AuthorStats>,
}

impl AuthorMetrics {
    #[must_use]
    pub fn compute(ag: &AuthorGraph) -> Self {
        let g = &ag.graph;
        let neighbours: Vec<BTreeSet<NodeIndex>> = g
            .node_identifiers()
            .map(|idx| {
                g.neighbors_undirected(idx)
                    .filter(|n| *n != idx)
                    .collect::<BTreeSet<_>>()
            })
            .collect();

        let mut stats = HashMap::with_capacity(g.node_count());
        for idx in g.node_identifiers() {
            let in_degree = g.neighbors_directed(idx, Direction::Incoming).count();
            let out_degree = g.neighbors_directed(idx, Direction::Outgoing).count();
            let clustering = local_clustering(&neighbours, idx);
            stats.insert(
                g[idx].clone(),
                AuthorStats {
                    in_degree,
                    out_degree,
                    clustering,
                },
            );
        }

        Self { stats }
    }

    /// Statistics for `author`; zeros for authors outside the graph.
    #[must_use]
    pub fn get(&self, author: &str) -> AuthorStats {
        self.stats.get(author).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

#[allow(clippy::cast_precision_loss)]
fn local_clustering(neighbours: &[BTreeSet<NodeIndex>], idx: NodeIndex) -> f64 {
    let own = &neighbours[idx.index()];
    let k = own.len();
    if k < 2 {
        return 0.0;
    }

    let members: Vec<NodeIndex> = own.iter().copied().collect();
    let mut links = 0usize;
    for (i, u) in members.iter().enumerate() {
        let adjacent = &neighbours[u.index()];
        links += members[i + 1..]
            .iter()
            .filter(|w| adjacent.contains(*w))
            .count();
    }

    (2 * links) as f64 / (k * (k - 1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> AuthorGraph {
        let mut g = AuthorGraph::new();
        for (a, b) in edges {
            g.set_edge(a, b, 1.0);
        }
        g
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn empty_graph_has_no_stats() {
        let m = AuthorMetrics::compute(&AuthorGraph::new());
        assert!(m.is_empty());
        assert_eq!(m.get("nobody@x.com"), AuthorStats::default());
    }

    #[test]
    fn degrees_follow_direction() {
        // a → b, a → c, c → a
        let m = AuthorMetrics::compute(&graph(&[("a", "b"), ("a", "c"), ("c", "a")]));
        assert_eq!(m.get("a").out_degree, 2);
        assert_eq!(m.get("a").in_degree, 1);
        assert_eq!(m.get("b").in_degree, 1);
        assert_eq!(m.get("b").out_degree, 0);
        assert_eq!(m.get("c").in_degree, 1);
        assert_eq!(m.get("c").out_degree, 1);
    }

    #[test]
    fn triangle_is_fully_clustered() {
        let m = AuthorMetrics::compute(&graph(&[("a", "b"), ("b", "c"), ("c", "a")]));
        for node in ["a", "b", "c"] {
            assert!(approx(m.get(node).clustering, 1.0), "{node}");
        }
    }

    #[test]
    fn reciprocal_edges_count_once_in_projection() {
        // a ↔ b, b ↔ c, a → c: undirected triangle
        let m = AuthorMetrics::compute(&graph(&[
            ("a", "b"),
            ("b", "a"),
            ("b", "c"),
            ("c", "b"),
            ("a", "c"),
        ]));
        assert!(approx(m.get("b").clustering, 1.0));
    }

    #[test]
    fn star_center_has_zero_clustering() {
        let m = AuthorMetrics::compute(&graph(&[("hub", "x"), ("hub", "y"), ("hub", "z")]));
        assert!(approx(m.get("hub").clustering, 0.0));
        assert!(approx(m.get("x").clustering, 0.0));
    }

    #[test]
    fn partial_clustering() {
        // hub has neighbours x, y, z; only x–y are linked: 1 of 3 pairs
        let m = AuthorMetrics::compute(&graph(&[
            ("hub", "x"),
            ("hub", "y"),
            ("hub", "z"),
            ("x", "y"),
        ]));
        assert!(approx(m.get("hub").clustering, 1.0 / 3.0));
        assert!(approx(m.get("x").clustering, 1.0));
    }

    #[test]
    fn self_loop_counts_for_degree_not_clustering() {
        let m = AuthorMetrics::compute(&graph(&[("a", "a"), ("a", "b"), ("b", "c"), ("c", "a")]));
        assert_eq!(m.get("a").in_degree, 2);
        assert_eq!(m.get("a").out_degree, 2);
        assert!(approx(m.get("a").clustering, 1.0));
    }
}
