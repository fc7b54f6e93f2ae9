//! Shared utilities for graph algorithms
//!
//! Provides a read-only, undirected, weighted view of a graph for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// A dense, integer-indexed view of an undirected graph in Compressed Sparse Row (CSR) format.
///
/// Every undirected edge `{u, v}` is stored twice, once in each endpoint's adjacency row.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbor indices
    pub targets: Vec<usize>,
    /// Edge weights: aligned with `targets`
    pub weights: Vec<f64>,
}

impl GraphView {
    /// Build a view over `nodes` from undirected weighted edges.
    ///
    /// Edges referencing unknown nodes and self-loops are skipped. Parallel edges are kept.
    pub fn from_undirected_edges(nodes: &[NodeId], edges: &[(NodeId, NodeId, f64)]) -> Self {
        let node_count = nodes.len();
        let index_to_node = nodes.to_vec();
        let node_to_index: HashMap<NodeId, usize> = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); node_count];
        for &(a, b, w) in edges {
            let (Some(&u), Some(&v)) = (node_to_index.get(&a), node_to_index.get(&b)) else {
                continue;
            };
            if u == v {
                continue;
            }
            rows[u].push((v, w));
            rows[v].push((u, w));
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        let mut weights = Vec::new();
        offsets.push(0);
        for row in rows {
            for (v, w) in row {
                targets.push(v);
                weights.push(w);
            }
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
            weights,
        }
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Get the degree of a node (by index)
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Get neighbors of a node
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Get weights aligned with `neighbors(idx)`
    pub fn neighbor_weights(&self, idx: usize) -> &[f64] {
        &self.weights[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Sum of incident edge weights
    pub fn weighted_degree(&self, idx: usize) -> f64 {
        self.neighbor_weights(idx).iter().sum()
    }

    /// Sum of all edge weights (each undirected edge counted once)
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum::<f64>() / 2.0
    }

    /// Induced subgraph over the given node ids, preserving their order.
    pub fn subgraph(&self, members: &[NodeId]) -> GraphView {
        let keep: HashMap<usize, NodeId> = members
            .iter()
            .filter_map(|id| self.node_to_index.get(id).map(|&idx| (idx, *id)))
            .collect();

        let mut edges = Vec::new();
        for (&u, &u_id) in &keep {
            for (&v, &w) in self.neighbors(u).iter().zip(self.neighbor_weights(u)) {
                if u < v {
                    if let Some(&v_id) = keep.get(&v) {
                        edges.push((u_id, v_id, w));
                    }
                }
            }
        }
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        GraphView::from_undirected_edges(members, &edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_undirected_edges() {
        let view = GraphView::from_undirected_edges(&[10, 20, 30], &[(10, 20, 0.5), (20, 30, 2.0), (30, 30, 1.0), (10, 99, 1.0)]);
        assert_eq!(view.node_count, 3);
        assert_eq!(view.edge_count(), 2);
        assert_eq!(view.degree(1), 2);
        assert_eq!(view.neighbors(0), &[1]);
        assert_eq!(view.weighted_degree(1), 2.5);
        assert_eq!(view.total_weight(), 2.5);
    }

    #[test]
    fn test_subgraph() {
        let view = GraphView::from_undirected_edges(&[1, 2, 3, 4], &[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]);
        let sub = view.subgraph(&[2, 3, 4]);
        assert_eq!(sub.node_count, 3);
        assert_eq!(sub.edge_count(), 2);
        assert_eq!(sub.index_to_node, vec![2, 3, 4]);
    }
}
