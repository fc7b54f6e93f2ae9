//! Graph topology statistics
//!
//! Density, degree and degree centrality for undirected views.

use super::common::{GraphView, NodeId};
use std::collections::HashMap;

/// Edge density `2E / (N(N-1))`; 0.0 for graphs with fewer than two nodes
pub fn density(view: &GraphView) -> f64 {
    let n = view.node_count;
    if n < 2 {
        return 0.0;
    }
    2.0 * view.edge_count() as f64 / (n * (n - 1)) as f64
}

/// Mean node degree; 0.0 for an empty graph
pub fn average_degree(view: &GraphView) -> f64 {
    if view.node_count == 0 {
        return 0.0;
    }
    2.0 * view.edge_count() as f64 / view.node_count as f64
}

/// Degree centrality: degree divided by `n - 1`
pub fn degree_centrality(view: &GraphView) -> HashMap<NodeId, f64> {
    let n = view.node_count;
    (0..n)
        .map(|idx| {
            let score = if n > 1 {
                view.degree(idx) as f64 / (n - 1) as f64
            } else {
                0.0
            };
            (view.index_to_node[idx], score)
        })
        .collect()
}
