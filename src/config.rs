//! Analysis configuration
//!
//! Every field has a default, so an empty YAML document is a valid config.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bounds (exclusive) of the `small`, `medium` and `large` grant size tiers.
/// Anything at or above `large` is `major`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeTierBounds {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl Default for SizeTierBounds {
    fn default() -> Self {
        Self {
            small: 10_000.0,
            medium: 100_000.0,
            large: 1_000_000.0,
        }
    }
}

/// Tunables for bundling and co-funding analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Default minimum number of distinct funders for a bundled grantee
    pub min_foundations: usize,
    /// Default combined-similarity threshold for network edges
    pub similarity_threshold: f64,
    /// Default cap on recommendations
    pub max_recommendations: usize,
    /// Years counted as "recent" for the recency score, ending at the latest year in the run
    pub recency_window_years: i32,
    /// Weight of the recency score in the combined similarity
    pub recency_boost: f64,
    /// Seed for community detection
    pub community_seed: u64,
    /// Betweenness above which a group member is flagged as a bridge
    pub bridge_betweenness_threshold: f64,
    /// Cap on thematic clusters
    pub max_thematic_clusters: usize,
    /// Cap on common-purpose keywords per grantee and per foundation pair
    pub max_purpose_keywords: usize,
    /// Minimum combined score for a peer-funder recommendation
    pub peer_min_score: f64,
    /// Combined score above which a peer-funder recommendation is high priority
    pub peer_high_priority_score: f64,
    /// Minimum group size for cluster-member recommendations
    pub cluster_min_members: usize,
    /// Cap on cluster-member recommendations per group
    pub cluster_max_recommendations: usize,
    pub size_tiers: SizeTierBounds,
    /// Jaro-Winkler threshold for merging name-keyed recipients (feature `fuzzy-matching`)
    pub fuzzy_name_threshold: Option<f64>,
    /// Deadline for a bundling run, in milliseconds
    pub deadline_ms: Option<u64>,
    /// Minimum number of foundation pairs per rayon work item
    pub parallel_pair_chunk: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_foundations: 2,
            similarity_threshold: 0.3,
            max_recommendations: 10,
            recency_window_years: 2,
            recency_boost: 0.2,
            community_seed: 42,
            bridge_betweenness_threshold: 0.5,
            max_thematic_clusters: 10,
            max_purpose_keywords: 5,
            peer_min_score: 0.5,
            peer_high_priority_score: 0.7,
            cluster_min_members: 3,
            cluster_max_recommendations: 5,
            size_tiers: SizeTierBounds::default(),
            fuzzy_name_threshold: None,
            deadline_ms: None,
            parallel_pair_chunk: 64,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_foundations == 0 {
            return Err(invalid("min_foundations", "must be at least 1"));
        }
        if self.recency_boost < 0.0 {
            return Err(invalid("recency_boost", "must not be negative"));
        }
        if self.recency_window_years < 1 {
            return Err(invalid("recency_window_years", "must be at least 1"));
        }
        if self.similarity_threshold < 0.0 {
            return Err(invalid("similarity_threshold", "must not be negative"));
        }
        if let Some(t) = self.fuzzy_name_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(invalid("fuzzy_name_threshold", "must be within [0, 1]"));
            }
        }
        let tiers = &self.size_tiers;
        if !(tiers.small <= tiers.medium && tiers.medium <= tiers.large) {
            return Err(invalid("size_tiers", "bounds must be non-decreasing"));
        }
        if self.parallel_pair_chunk == 0 {
            return Err(invalid("parallel_pair_chunk", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AnalysisConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = "similarity_threshold: 0.45\ncommunity_seed: 7\nsize_tiers:\n  small: 5000\n";
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.similarity_threshold, 0.45);
        assert_eq!(config.community_seed, 7);
        assert_eq!(config.size_tiers.small, 5000.0);
        assert_eq!(config.size_tiers.large, 1_000_000.0);
        assert_eq!(config.max_recommendations, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AnalysisConfig::from_yaml_str("min_foundations: 0"),
            Err(ConfigError::Invalid { field: "min_foundations", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_yaml_str("fuzzy_name_threshold: 1.5"),
            Err(ConfigError::Invalid { field: "fuzzy_name_threshold", .. })
        ));
        assert!(matches!(AnalysisConfig::from_yaml_str("min_foundations: [1"), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deadline_ms: 1500").unwrap();
        let config = AnalysisConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.deadline_ms, Some(1500));
    }
}
