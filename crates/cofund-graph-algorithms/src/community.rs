//! Community detection algorithms
//!
//! Connected components (union-find) and Louvain modularity optimization.

use super::common::{GraphView, NodeId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};

/// Result of the connected components algorithm
pub struct ComponentsResult {
    /// Components, each sorted by NodeId, ordered by size (largest first)
    pub components: Vec<Vec<NodeId>>,
    /// Map of NodeId -> index into `components`
    pub node_component: HashMap<NodeId, usize>,
}

impl ComponentsResult {
    pub fn count(&self) -> usize {
        self.components.len()
    }

    pub fn is_connected(&self) -> bool {
        self.components.len() == 1
    }
}

/// Union-Find data structure
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            self.parent[i] = self.find(self.parent[i]); // Path compression
        }
        self.parent[i]
    }

    fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i != root_j {
            match self.rank[root_i].cmp(&self.rank[root_j]) {
                std::cmp::Ordering::Less => self.parent[root_i] = root_j,
                std::cmp::Ordering::Greater => self.parent[root_j] = root_i,
                std::cmp::Ordering::Equal => {
                    self.parent[root_j] = root_i;
                    self.rank[root_i] += 1;
                }
            }
        }
    }
}

/// Connected Components
///
/// Finds all disjoint subgraphs in the graph.
pub fn connected_components(view: &GraphView) -> ComponentsResult {
    let n = view.node_count;
    let mut uf = UnionFind::new(n);

    for u_idx in 0..n {
        for &v_idx in view.neighbors(u_idx) {
            uf.union(u_idx, v_idx);
        }
    }

    let mut by_root: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for i in 0..n {
        let root = uf.find(i);
        by_root.entry(root).or_default().push(view.index_to_node[i]);
    }

    let components = sort_groups(by_root.into_values().collect());
    let node_component = index_groups(&components);

    ComponentsResult {
        components,
        node_component,
    }
}

/// Louvain configuration
#[derive(Debug, Clone)]
pub struct LouvainConfig {
    /// Seed for the node visiting order; identical seeds give identical partitions
    pub seed: u64,
    /// Maximum number of aggregation levels
    pub max_levels: usize,
    /// Maximum local-moving sweeps per level
    pub max_sweeps: usize,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_levels: 16,
            max_sweeps: 64,
        }
    }
}

/// Result of Louvain community detection
pub struct LouvainResult {
    /// Communities, each sorted by NodeId, ordered by size (largest first)
    pub communities: Vec<Vec<NodeId>>,
    /// Map of NodeId -> index into `communities`
    pub node_community: HashMap<NodeId, usize>,
    /// Modularity of the final partition
    pub modularity: f64,
}

/// Weighted graph used between aggregation levels
struct LevelGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl LevelGraph {
    fn from_view(view: &GraphView) -> Self {
        let adjacency = (0..view.node_count)
            .map(|u| {
                view.neighbors(u)
                    .iter()
                    .copied()
                    .zip(view.neighbor_weights(u).iter().copied())
                    .collect()
            })
            .collect();
        LevelGraph {
            adjacency,
            self_loops: vec![0.0; view.node_count],
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    fn strength(&self, i: usize) -> f64 {
        self.adjacency[i].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[i]
    }

    /// Local moving phase. Returns dense community labels and whether anything moved.
    fn local_moving(&self, rng: &mut StdRng, max_sweeps: usize) -> (Vec<usize>, bool) {
        let n = self.len();
        let strengths: Vec<f64> = (0..n).map(|i| self.strength(i)).collect();
        let m2: f64 = strengths.iter().sum();
        let mut community: Vec<usize> = (0..n).collect();
        if m2 <= 0.0 {
            return (community, false);
        }

        let mut totals = strengths.clone();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut improved = false;
        for _ in 0..max_sweeps {
            let mut moved = false;
            for &i in &order {
                let current = community[i];
                let k_i = strengths[i];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &self.adjacency[i] {
                    *links.entry(community[j]).or_insert(0.0) += w;
                }

                totals[current] -= k_i;
                let mut best = current;
                let mut best_gain = links.get(&current).copied().unwrap_or(0.0) - totals[current] * k_i / m2;
                for (&candidate, &w_in) in &links {
                    let gain = w_in - totals[candidate] * k_i / m2;
                    if gain > best_gain + 1e-12 {
                        best = candidate;
                        best_gain = gain;
                    }
                }
                totals[best] += k_i;

                if best != current {
                    community[i] = best;
                    moved = true;
                    improved = true;
                }
            }
            if !moved {
                break;
            }
        }

        (relabel(&community), improved)
    }

    /// Collapse each community into a single node.
    fn aggregate(&self, community: &[usize]) -> LevelGraph {
        let count = community.iter().max().map_or(0, |c| c + 1);
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut self_loops = vec![0.0; count];

        for (i, edges) in self.adjacency.iter().enumerate() {
            let ci = community[i];
            self_loops[ci] += self.self_loops[i];
            for &(j, w) in edges {
                let cj = community[j];
                if ci == cj {
                    // Internal edges are seen from both endpoints
                    self_loops[ci] += w / 2.0;
                } else {
                    *links[ci].entry(cj).or_insert(0.0) += w;
                }
            }
        }

        LevelGraph {
            adjacency: links.into_iter().map(|row| row.into_iter().collect()).collect(),
            self_loops,
        }
    }
}

/// Louvain community detection
///
/// Greedy modularity maximization with multi-level aggregation. The visiting order at
/// each level is shuffled by an RNG seeded from `config.seed`.
pub fn louvain(view: &GraphView, config: &LouvainConfig) -> LouvainResult {
    let n = view.node_count;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut membership: Vec<usize> = (0..n).collect();
    let mut level = LevelGraph::from_view(view);

    for _ in 0..config.max_levels {
        let (community, improved) = level.local_moving(&mut rng, config.max_sweeps);
        if !improved {
            break;
        }
        for slot in membership.iter_mut() {
            *slot = community[*slot];
        }
        level = level.aggregate(&community);
    }

    let mut grouped: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for (idx, &c) in membership.iter().enumerate() {
        grouped.entry(c).or_default().push(view.index_to_node[idx]);
    }
    let communities = sort_groups(grouped.into_values().collect());
    let node_community = index_groups(&communities);
    let modularity = modularity(view, &node_community);

    LouvainResult {
        communities,
        node_community,
        modularity,
    }
}

/// Newman modularity of a partition
pub fn modularity(view: &GraphView, node_community: &HashMap<NodeId, usize>) -> f64 {
    let m = view.total_weight();
    if m <= 0.0 {
        return 0.0;
    }

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut totals: HashMap<usize, f64> = HashMap::new();
    for u in 0..view.node_count {
        let cu = node_community[&view.index_to_node[u]];
        *totals.entry(cu).or_insert(0.0) += view.weighted_degree(u);
        for (&v, &w) in view.neighbors(u).iter().zip(view.neighbor_weights(u)) {
            if u < v && node_community[&view.index_to_node[v]] == cu {
                *internal.entry(cu).or_insert(0.0) += w;
            }
        }
    }

    totals
        .iter()
        .map(|(c, tot)| internal.get(c).copied().unwrap_or(0.0) / m - (tot / (2.0 * m)).powi(2))
        .sum()
}

fn relabel(community: &[usize]) -> Vec<usize> {
    let mut labels = HashMap::new();
    community
        .iter()
        .map(|c| {
            let next = labels.len();
            *labels.entry(*c).or_insert(next)
        })
        .collect()
}

fn sort_groups(mut groups: Vec<Vec<NodeId>>) -> Vec<Vec<NodeId>> {
    for group in groups.iter_mut() {
        group.sort_unstable();
    }
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    groups
}

fn index_groups(groups: &[Vec<NodeId>]) -> HashMap<NodeId, usize> {
    groups
        .iter()
        .enumerate()
        .flat_map(|(c, members)| members.iter().map(move |&id| (id, c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles {1,2,3} and {4,5,6} joined by a weak 3-4 bridge.
    fn two_triangles() -> GraphView {
        GraphView::from_undirected_edges(
            &[1, 2, 3, 4, 5, 6],
            &[
                (1, 2, 1.0),
                (2, 3, 1.0),
                (1, 3, 1.0),
                (4, 5, 1.0),
                (5, 6, 1.0),
                (4, 6, 1.0),
                (3, 4, 0.1),
            ],
        )
    }

    #[test]
    fn test_connected_components() {
        // Edges: 1-2, 3-4-5, 6 (isolated)
        let view = GraphView::from_undirected_edges(&[1, 2, 3, 4, 5, 6], &[(1, 2, 1.0), (3, 4, 1.0), (4, 5, 1.0)]);
        let result = connected_components(&view);

        assert_eq!(result.count(), 3);
        assert!(!result.is_connected());
        assert_eq!(result.components[0], vec![3, 4, 5]);
        assert_eq!(result.node_component[&1], result.node_component[&2]);
        assert_ne!(result.node_component[&1], result.node_component[&3]);
        assert_eq!(result.components[2], vec![6]);
    }

    #[test]
    fn test_louvain_splits_triangles() {
        let result = louvain(&two_triangles(), &LouvainConfig::default());

        assert_eq!(result.communities.len(), 2);
        assert_eq!(result.communities[0], vec![1, 2, 3]);
        assert_eq!(result.communities[1], vec![4, 5, 6]);
        assert!(result.modularity > 0.3);
    }

    #[test]
    fn test_louvain_is_reproducible() {
        let view = two_triangles();
        let config = LouvainConfig { seed: 7, ..Default::default() };
        let a = louvain(&view, &config);
        let b = louvain(&view, &config);
        assert_eq!(a.communities, b.communities);
        assert_eq!(a.modularity, b.modularity);
    }

    #[test]
    fn test_louvain_without_edges() {
        let view = GraphView::from_undirected_edges(&[1, 2, 3], &[]);
        let result = louvain(&view, &LouvainConfig::default());
        assert_eq!(result.communities.len(), 3);
        assert_eq!(result.modularity, 0.0);
    }
}
