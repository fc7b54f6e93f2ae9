//! Cofund: multi-foundation grant aggregation and co-funding network analysis
//!
//! Grant records published by several foundations are resolved to canonical
//! recipients, recipients funded by multiple foundations ("bundled grantees") are
//! detected, and foundations are compared by the recipients they share. The
//! resulting similarity network is partitioned into peer groups and used to
//! recommend foundations worth prospecting.
//!
//! # Pipeline
//!
//! - Recipient normalization and grant aggregation (`grants`)
//! - Bundled-grantee detection, overlap matrix and thematic clusters (`bundling`)
//! - Similarity refinement, network construction, peer groups and
//!   recommendations (`network`)
//! - Storage seam for fetching grants per foundation and tax year (`store`)
//!
//! ## Example Usage
//!
//! ```rust
//! use cofund::{GrantAnalyzer, GrantRecord, InMemoryGrantStore};
//! use std::sync::Arc;
//!
//! let store = InMemoryGrantStore::from_records(vec![
//!     GrantRecord::new("f1", "First Trust", "Food Bank", 5_000.0, 2023),
//!     GrantRecord::new("f2", "Second Fund", "Food Bank Inc", 7_500.0, 2023),
//! ]);
//! let analyzer = GrantAnalyzer::new(Arc::new(store));
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let ids = vec!["f1".to_string(), "f2".to_string()];
//! let bundling = runtime.block_on(analyzer.analyze_bundling(&ids, &[2023], 2)).unwrap();
//! assert_eq!(bundling.bundled_grantees.len(), 1);
//!
//! let cofunding = analyzer.analyze_cofunding(&bundling, 0.3, 10).unwrap();
//! assert_eq!(cofunding.network_stats.node_count, 2);
//! ```

#![warn(clippy::all)]

pub mod analyzer;
pub mod bundling;
pub mod config;
pub mod error;
pub mod grants;
pub mod network;
pub mod store;

// Re-export main types for convenience
pub use analyzer::{
    analyze_cofunding, analyze_grants, BundlingResult, BundlingStatistics, CoFundingOptions, CoFundingResult,
    DataQuality, GrantAnalyzer,
};
pub use bundling::{BundledGrantee, FoundationOverlap, FundingStability, ThematicCluster};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult, ConfigError};
pub use grants::{normalize, AggregatedRecipient, CanonicalRecipientKey, FundingSource, GrantRecord, GrantsByFoundation, SizeTier};
pub use network::{
    CoFundingNetwork, FunderRecommendation, FunderSimilarity, NetworkSnapshot, NetworkStats, PeerFunderGroup, Priority,
    RecommendOptions, RecommendationType,
};
pub use store::{GrantStore, InMemoryGrantStore, JsonGrantStore, StoreError, StoreResult};

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
