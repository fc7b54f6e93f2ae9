//! Co-funding network construction, statistics and peer-group detection
//!
//! Foundations become nodes of an undirected graph whenever they take part in a
//! similarity pair at or above the threshold; each such pair becomes an edge weighted
//! by its combined score. Communities come from seeded Louvain clustering.

use super::similarity::FunderSimilarity;
use cofund_graph_algorithms::{
    average_degree, betweenness_centrality, connected_components, degree_centrality, density, louvain, path_stats,
    GraphView, LouvainConfig, NodeId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Settings for community detection and bridge flagging
#[derive(Debug, Clone, Copy)]
pub struct NetworkSettings {
    pub community_seed: u64,
    pub bridge_betweenness_threshold: f64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            community_seed: 42,
            bridge_betweenness_threshold: 0.5,
        }
    }
}

/// Graph-level statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub average_degree: f64,
    pub is_connected: bool,
    pub component_count: usize,
    /// Hop diameter; only reported for connected graphs
    pub diameter: Option<usize>,
    /// Mean hop distance; only reported for connected graphs
    pub average_path_length: Option<f64>,
    pub modularity: f64,
    /// Up to five foundations with the highest degree centrality
    pub most_central: Vec<String>,
}

/// A community of foundations in the co-funding network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerFunderGroup {
    pub group_id: usize,
    pub foundations: Vec<String>,
    pub member_count: usize,
    /// Co-funding amount summed over the group's internal edges
    pub intra_group_funding: f64,
    /// Internal edges over possible edges among members
    pub cluster_density: f64,
    pub average_similarity: f64,
    /// Members whose in-group betweenness exceeds the bridge threshold
    pub bridge_foundations: Vec<String>,
}

impl PeerFunderGroup {
    pub fn contains(&self, foundation_id: &str) -> bool {
        self.foundations.iter().any(|f| f == foundation_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkNode {
    pub id: String,
    pub name: String,
    pub degree: usize,
    pub degree_centrality: f64,
    pub betweenness: f64,
    /// Index into the peer group list, when the node belongs to a retained group
    pub community: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub jaccard: f64,
    pub shared_recipients: usize,
}

/// Serializable node/edge list of the network
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NetworkSnapshot {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

/// A built co-funding network.
///
/// Holds the graph, its statistics and peer groups so that recommendations for
/// different requesters can reuse one build.
#[derive(Debug, Clone)]
pub struct CoFundingNetwork {
    view: GraphView,
    foundation_ids: Vec<String>,
    /// Similarity pairs at or above the threshold, i.e. the edges
    pub similarities: Vec<FunderSimilarity>,
    pub stats: NetworkStats,
    pub peer_groups: Vec<PeerFunderGroup>,
    pub snapshot: NetworkSnapshot,
}

impl CoFundingNetwork {
    pub fn foundation_ids(&self) -> &[String] {
        &self.foundation_ids
    }

    pub fn node_count(&self) -> usize {
        self.view.node_count
    }

    /// Neighboring foundations of `foundation_id`, in id order
    pub fn neighbors(&self, foundation_id: &str) -> Vec<&str> {
        let Some(idx) = self.foundation_ids.iter().position(|f| f == foundation_id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .view
            .neighbors(idx)
            .iter()
            .map(|&n| self.foundation_ids[n].as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Build the network from similarity pairs, keeping pairs whose combined score is at
/// or above `threshold`.
///
/// Graphs with fewer than two nodes yield no peer groups. Singleton communities are
/// discarded.
pub fn build_network(similarities: &[FunderSimilarity], threshold: f64, settings: NetworkSettings) -> CoFundingNetwork {
    let qualifying: Vec<FunderSimilarity> = similarities
        .iter()
        .filter(|s| s.combined_score >= threshold)
        .cloned()
        .collect();

    let mut names: BTreeMap<String, String> = BTreeMap::new();
    for s in &qualifying {
        let o = &s.overlap;
        names.entry(o.foundation_a.clone()).or_insert_with(|| o.foundation_a_name.clone());
        names.entry(o.foundation_b.clone()).or_insert_with(|| o.foundation_b_name.clone());
    }
    let foundation_ids: Vec<String> = names.keys().cloned().collect();
    let index: HashMap<&str, NodeId> = foundation_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i as NodeId))
        .collect();

    let nodes: Vec<NodeId> = (0..foundation_ids.len() as NodeId).collect();
    let edges: Vec<(NodeId, NodeId, f64)> = qualifying
        .iter()
        .map(|s| (index[s.foundation_a()], index[s.foundation_b()], s.combined_score))
        .collect();
    let view = GraphView::from_undirected_edges(&nodes, &edges);

    let centrality = degree_centrality(&view);
    let betweenness = betweenness_centrality(&view);
    let components = connected_components(&view);

    let (peer_groups, modularity) = if view.node_count < 2 {
        debug!("Network has {} nodes; skipping community detection", view.node_count);
        (Vec::new(), 0.0)
    } else {
        detect_peer_groups(&view, &foundation_ids, &qualifying, settings)
    };

    let (diameter, average_path_length) = if components.is_connected() && view.node_count > 1 {
        let paths = path_stats(&view);
        (Some(paths.diameter), Some(paths.average_path_length))
    } else {
        (None, None)
    };

    let mut by_centrality: Vec<(&String, f64)> = foundation_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id, centrality[&(i as NodeId)]))
        .collect();
    by_centrality.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let stats = NetworkStats {
        node_count: view.node_count,
        edge_count: view.edge_count(),
        density: density(&view),
        average_degree: average_degree(&view),
        is_connected: components.is_connected(),
        component_count: components.count(),
        diameter,
        average_path_length,
        modularity,
        most_central: by_centrality.into_iter().take(5).map(|(id, _)| id.clone()).collect(),
    };

    let community_of: HashMap<&str, usize> = peer_groups
        .iter()
        .flat_map(|g| g.foundations.iter().map(move |f| (f.as_str(), g.group_id)))
        .collect();
    let snapshot = NetworkSnapshot {
        nodes: foundation_ids
            .iter()
            .enumerate()
            .map(|(i, id)| NetworkNode {
                id: id.clone(),
                name: names[id].clone(),
                degree: view.degree(i),
                degree_centrality: centrality[&(i as NodeId)],
                betweenness: betweenness[&(i as NodeId)],
                community: community_of.get(id.as_str()).copied(),
            })
            .collect(),
        edges: qualifying
            .iter()
            .map(|s| NetworkEdge {
                source: s.foundation_a().to_string(),
                target: s.foundation_b().to_string(),
                weight: s.combined_score,
                jaccard: s.overlap.jaccard_similarity,
                shared_recipients: s.overlap.shared_count,
            })
            .collect(),
    };

    info!(
        "Co-funding network: {} nodes, {} edges, {} components, {} peer groups",
        stats.node_count,
        stats.edge_count,
        stats.component_count,
        peer_groups.len()
    );

    CoFundingNetwork {
        view,
        foundation_ids,
        similarities: qualifying,
        stats,
        peer_groups,
        snapshot,
    }
}

fn detect_peer_groups(
    view: &GraphView,
    foundation_ids: &[String],
    edges: &[FunderSimilarity],
    settings: NetworkSettings,
) -> (Vec<PeerFunderGroup>, f64) {
    let config = LouvainConfig {
        seed: settings.community_seed,
        ..Default::default()
    };
    let result = louvain(view, &config);

    let mut groups = Vec::new();
    for members in result.communities.iter().filter(|c| c.len() > 1) {
        let sub = view.subgraph(members);
        let member_ids: BTreeSet<&str> = members.iter().map(|&n| foundation_ids[n as usize].as_str()).collect();

        let internal: Vec<&FunderSimilarity> = edges
            .iter()
            .filter(|s| member_ids.contains(s.foundation_a()) && member_ids.contains(s.foundation_b()))
            .collect();
        let average_similarity = if internal.is_empty() {
            0.0
        } else {
            internal.iter().map(|s| s.combined_score).sum::<f64>() / internal.len() as f64
        };

        let in_group_betweenness = betweenness_centrality(&sub);
        let bridge_foundations: Vec<String> = members
            .iter()
            .filter(|n| in_group_betweenness[*n] > settings.bridge_betweenness_threshold)
            .map(|&n| foundation_ids[n as usize].clone())
            .collect();

        let group_id = groups.len();
        debug!(
            "Peer group {}: {} members, {} bridges",
            group_id,
            members.len(),
            bridge_foundations.len()
        );
        groups.push(PeerFunderGroup {
            group_id,
            foundations: member_ids.iter().map(|s| s.to_string()).collect(),
            member_count: members.len(),
            intra_group_funding: internal.iter().map(|s| s.cofunding_amount).sum(),
            cluster_density: density(&sub),
            average_similarity,
            bridge_foundations,
        });
    }

    (groups, result.modularity)
}
