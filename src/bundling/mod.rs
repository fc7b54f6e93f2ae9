//! Bundled-grantee detection, foundation overlap and thematic clustering

pub mod detector;
pub mod overlap;
pub mod themes;

pub use detector::{detect, BundledGrantee, FundingStability};
pub use overlap::{build_overlaps, foundation_names, FoundationOverlap};
pub use themes::{cluster, ThematicCluster};
