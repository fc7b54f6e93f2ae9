pub mod common;
pub mod community;
pub mod pathfinding;
pub mod topology;

pub use common::{GraphView, NodeId};
pub use community::{connected_components, louvain, modularity, ComponentsResult, LouvainConfig, LouvainResult};
pub use pathfinding::{betweenness_centrality, bfs_distances, path_stats, PathStats};
pub use topology::{average_degree, degree_centrality, density};
