//! Pathfinding and centrality algorithms
//!
//! Hop-count BFS, all-pairs path statistics and Brandes betweenness centrality.
//! Distances ignore edge weights.

use super::common::{GraphView, NodeId};
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};

/// Aggregate shortest-path statistics over all reachable ordered pairs
#[derive(Debug, Clone, PartialEq)]
pub struct PathStats {
    /// Longest shortest path (in hops) between any reachable pair
    pub diameter: usize,
    /// Mean shortest path length over reachable pairs (0.0 when there are none)
    pub average_path_length: f64,
    /// Number of reachable ordered pairs considered
    pub reachable_pairs: usize,
}

/// Breadth-First Search hop distances from `source_idx` to every node (by index)
pub fn bfs_distances(view: &GraphView, source_idx: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; view.node_count];
    let mut queue = VecDeque::new();

    dist[source_idx] = Some(0);
    queue.push_back(source_idx);

    while let Some(current) = queue.pop_front() {
        let next_dist = dist[current].map(|d| d + 1);
        for &next in view.neighbors(current) {
            if dist[next].is_none() {
                dist[next] = next_dist;
                queue.push_back(next);
            }
        }
    }

    dist
}

/// Diameter and average shortest path length over all reachable pairs
pub fn path_stats(view: &GraphView) -> PathStats {
    let per_source: Vec<(usize, usize, usize)> = (0..view.node_count)
        .into_par_iter()
        .map(|s| {
            let mut longest = 0;
            let mut total = 0;
            let mut pairs = 0;
            for (t, d) in bfs_distances(view, s).into_iter().enumerate() {
                if let Some(d) = d {
                    if t != s {
                        longest = longest.max(d);
                        total += d;
                        pairs += 1;
                    }
                }
            }
            (longest, total, pairs)
        })
        .collect();

    let diameter = per_source.iter().map(|p| p.0).max().unwrap_or(0);
    let total: usize = per_source.iter().map(|p| p.1).sum();
    let reachable_pairs: usize = per_source.iter().map(|p| p.2).sum();

    PathStats {
        diameter,
        average_path_length: if reachable_pairs > 0 {
            total as f64 / reachable_pairs as f64
        } else {
            0.0
        },
        reachable_pairs,
    }
}

/// Brandes betweenness centrality for an undirected graph.
///
/// Scores are normalized by `(n-1)(n-2)/2`, so a star centre scores 1.0.
/// Graphs with fewer than three nodes score 0.0 everywhere.
pub fn betweenness_centrality(view: &GraphView) -> HashMap<NodeId, f64> {
    let n = view.node_count;
    if n < 3 {
        return view.index_to_node.iter().map(|&id| (id, 0.0)).collect();
    }

    let raw = (0..n)
        .into_par_iter()
        .map(|s| single_source_dependencies(view, s))
        .reduce(
            || vec![0.0; n],
            |mut acc, part| {
                for (a, p) in acc.iter_mut().zip(part) {
                    *a += p;
                }
                acc
            },
        );

    // Each undirected pair is counted from both endpoints
    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    raw.into_iter()
        .enumerate()
        .map(|(idx, score)| (view.index_to_node[idx], score * scale))
        .collect()
}

fn single_source_dependencies(view: &GraphView, s: usize) -> Vec<f64> {
    let n = view.node_count;
    let mut stack = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist: Vec<i64> = vec![-1; n];
    let mut queue = VecDeque::new();

    sigma[s] = 1.0;
    dist[s] = 0;
    queue.push_back(s);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in view.neighbors(v) {
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
    }
    delta[s] = 0.0;
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> GraphView {
        // 1 is the hub of 2, 3, 4
        GraphView::from_undirected_edges(&[1, 2, 3, 4], &[(1, 2, 1.0), (1, 3, 1.0), (1, 4, 1.0)])
    }

    #[test]
    fn test_bfs_distances() {
        let view = GraphView::from_undirected_edges(&[1, 2, 3, 4], &[(1, 2, 1.0), (2, 3, 1.0)]);
        let dist = bfs_distances(&view, 0);
        assert_eq!(dist, vec![Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn test_path_stats_on_path_graph() {
        // 1-2-3: pair distances 1,1,2 in both directions
        let view = GraphView::from_undirected_edges(&[1, 2, 3], &[(1, 2, 1.0), (2, 3, 1.0)]);
        let stats = path_stats(&view);
        assert_eq!(stats.diameter, 2);
        assert_eq!(stats.reachable_pairs, 6);
        assert!((stats.average_path_length - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_betweenness_star() {
        let scores = betweenness_centrality(&star());
        assert!((scores[&1] - 1.0).abs() < 1e-9);
        assert_eq!(scores[&2], 0.0);
        assert_eq!(scores[&4], 0.0);
    }

    #[test]
    fn test_betweenness_small_graph() {
        let view = GraphView::from_undirected_edges(&[1, 2], &[(1, 2, 1.0)]);
        let scores = betweenness_centrality(&view);
        assert_eq!(scores.len(), 2);
        assert!(scores.values().all(|&s| s == 0.0));
    }
}
