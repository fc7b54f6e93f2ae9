//! Co-funding network: similarity refinement, graph construction and recommendations

pub mod builder;
pub mod recommend;
pub mod similarity;

pub use builder::{
    build_network, CoFundingNetwork, NetworkEdge, NetworkNode, NetworkSettings, NetworkSnapshot, NetworkStats,
    PeerFunderGroup,
};
pub use recommend::{recommend, FunderRecommendation, Priority, RecommendOptions, RecommendationType};
pub use similarity::{combined_score, compute_similarities, FunderSimilarity, SimilarityParams};
