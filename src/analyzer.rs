//! Analysis entry points
//!
//! `analyze_bundling` fetches grants for a set of foundations and years, aggregates
//! them and finds bundled grantees, overlaps and themes. `analyze_cofunding` turns a
//! bundling result into a co-funding network, peer groups and recommendations.

use crate::bundling::{build_overlaps, cluster, detect, BundledGrantee, FoundationOverlap, ThematicCluster};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::grants::{aggregate, canonical_key, AggregatedRecipients, GrantRecord, GrantsByFoundation};
use crate::network::{
    build_network, compute_similarities, CoFundingNetwork, FunderRecommendation, FunderSimilarity, NetworkSettings,
    NetworkSnapshot, NetworkStats, PeerFunderGroup, RecommendOptions, SimilarityParams,
};
use crate::store::{GrantStore, StoreResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Completeness and entity-matching confidence of the analyzed grants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    /// Mean fraction of {EIN, positive amount, purpose} present per record.
    /// A record whose recipient cannot be identified scores zero.
    pub completeness: f64,
    /// Fraction of distinct recipients identified by EIN rather than by name
    pub ein_match_confidence: f64,
    /// Grants left out of aggregation for lack of an EIN and a usable name
    pub unresolved_grants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundlingStatistics {
    pub total_grants_analyzed: usize,
    pub total_funding: f64,
    pub avg_grants_per_foundation: f64,
    pub avg_funding_per_foundation: f64,
    pub bundled_funding: f64,
    pub avg_funders_per_bundled_grantee: f64,
    pub data_quality: DataQuality,
}

/// Output of a bundling run
#[derive(Debug, Clone, Serialize)]
pub struct BundlingResult {
    pub foundation_ids: Vec<String>,
    /// Foundations dropped because their grants could not be fetched
    pub excluded_foundations: Vec<String>,
    pub tax_years: Vec<i32>,
    pub min_foundations: usize,
    pub total_foundations_analyzed: usize,
    pub total_grantees: usize,
    pub bundled_grantees: Vec<BundledGrantee>,
    pub overlaps: Vec<FoundationOverlap>,
    pub thematic_clusters: Vec<ThematicCluster>,
    pub statistics: BundlingStatistics,
    pub processing_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
    #[serde(skip)]
    pub aggregated: AggregatedRecipients,
}

/// Output of a co-funding run
#[derive(Debug, Clone, Serialize)]
pub struct CoFundingResult {
    pub similarity_threshold: f64,
    pub similarities: Vec<FunderSimilarity>,
    pub above_threshold: Vec<FunderSimilarity>,
    pub peer_groups: Vec<PeerFunderGroup>,
    pub network: NetworkSnapshot,
    pub network_stats: NetworkStats,
    pub recommendations: Vec<FunderRecommendation>,
    pub processing_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

/// Parameters of a co-funding run
#[derive(Debug, Clone)]
pub struct CoFundingOptions {
    pub similarity_threshold: f64,
    pub max_recommendations: usize,
    /// Foundations the requester already works with
    pub known_foundations: Vec<String>,
}

impl CoFundingOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            max_recommendations: config.max_recommendations,
            known_foundations: Vec::new(),
        }
    }
}

/// Runs analyses against a grant store
pub struct GrantAnalyzer<S: GrantStore> {
    store: Arc<S>,
    config: AnalysisConfig,
}

impl<S: GrantStore> GrantAnalyzer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(store: Arc<S>, config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Fetch, aggregate and analyze grants of `foundation_ids` over `tax_years`.
    ///
    /// Foundations whose grants cannot be fetched are excluded with a warning. Fails
    /// only on insufficient input or when the configured deadline elapses.
    pub async fn analyze_bundling(
        &self,
        foundation_ids: &[String],
        tax_years: &[i32],
        min_foundations: usize,
    ) -> AnalysisResult<BundlingResult> {
        let started = Instant::now();
        let ids: BTreeSet<&str> = foundation_ids.iter().map(String::as_str).collect();
        if ids.len() < 2 {
            return Err(AnalysisError::InsufficientFoundations {
                required: 2,
                supplied: ids.len(),
            });
        }
        let years: BTreeSet<i32> = tax_years.iter().copied().collect();
        if years.is_empty() {
            return Err(AnalysisError::MissingTaxYears);
        }
        if min_foundations == 0 {
            return Err(AnalysisError::InvalidParameter {
                name: "min_foundations",
                reason: "must be at least 1".to_string(),
            });
        }

        let deadline = self.config.deadline_ms.map(Duration::from_millis);
        let exceeded = || AnalysisError::DeadlineExceeded {
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        let run = self.run_bundling(ids, years, min_foundations, started);
        let result = match deadline {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| exceeded())??,
            None => run.await?,
        };
        // A result that completes after the deadline is discarded as well
        if deadline.is_some_and(|limit| started.elapsed() > limit) {
            return Err(exceeded());
        }
        Ok(result)
    }

    async fn run_bundling(
        &self,
        ids: BTreeSet<&str>,
        years: BTreeSet<i32>,
        min_foundations: usize,
        started: Instant,
    ) -> AnalysisResult<BundlingResult> {
        info!("Bundling analysis: {} foundations, {} tax years", ids.len(), years.len());

        let requests = ids
            .iter()
            .flat_map(|&id| years.iter().map(move |&year| (id, year)))
            .map(|(id, year)| async move { (id, self.store.fetch_grants(id, year).await) });
        let responses: Vec<(&str, StoreResult<Vec<GrantRecord>>)> = join_all(requests).await;

        let mut grants = GrantsByFoundation::new();
        let mut failed: BTreeSet<&str> = BTreeSet::new();
        for (id, response) in responses {
            match response {
                Ok(records) => grants.entry(id.to_string()).or_default().extend(records),
                Err(e) => {
                    if failed.insert(id) {
                        warn!("Excluding foundation {}: {}", id, e);
                    }
                }
            }
        }
        for id in &failed {
            grants.remove(*id);
        }

        // CPU-bound; keeps the runtime free to fire the deadline timer
        let config = self.config.clone();
        let mut result = tokio::task::spawn_blocking(move || analyze_grants(grants, min_foundations, &config)).await??;
        result.excluded_foundations = failed.into_iter().map(str::to_string).collect();
        result.tax_years = years.into_iter().collect();
        result.processing_time_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Co-funding analysis with explicit threshold and recommendation cap
    pub fn analyze_cofunding(
        &self,
        bundling: &BundlingResult,
        similarity_threshold: f64,
        max_recommendations: usize,
    ) -> AnalysisResult<CoFundingResult> {
        let options = CoFundingOptions {
            similarity_threshold,
            max_recommendations,
            known_foundations: Vec::new(),
        };
        analyze_cofunding(bundling, &options, &self.config)
    }

    pub fn analyze_cofunding_with(
        &self,
        bundling: &BundlingResult,
        options: &CoFundingOptions,
    ) -> AnalysisResult<CoFundingResult> {
        analyze_cofunding(bundling, options, &self.config)
    }

    /// Build the network once for repeated `CoFundingNetwork::recommend` calls
    pub fn build_network(&self, bundling: &BundlingResult, similarity_threshold: f64) -> CoFundingNetwork {
        let similarities = similarities_for(bundling, &self.config);
        build_network(&similarities, similarity_threshold, network_settings(&self.config))
    }
}

/// Bundling analysis over grants already in memory.
///
/// Every key of `grants` counts as an analyzed foundation, even one with no grants.
pub fn analyze_grants(
    grants: GrantsByFoundation,
    min_foundations: usize,
    config: &AnalysisConfig,
) -> AnalysisResult<BundlingResult> {
    let started = Instant::now();
    let foundation_ids: Vec<String> = grants.keys().cloned().collect();
    if foundation_ids.len() < 2 {
        return Err(AnalysisError::InsufficientFoundations {
            required: 2,
            supplied: foundation_ids.len(),
        });
    }

    let aggregated = aggregate(&grants, config);
    let bundled_grantees = detect(&aggregated, min_foundations, config.max_purpose_keywords);
    let overlaps = build_overlaps(&aggregated, &foundation_ids, config.parallel_pair_chunk)?;
    let thematic_clusters = cluster(&bundled_grantees, config.max_thematic_clusters);
    let statistics = statistics(&grants, &aggregated, &bundled_grantees);

    info!(
        "Bundling complete: {} grants, {} recipients, {} bundled, {} overlapping pairs",
        statistics.total_grants_analyzed,
        aggregated.len(),
        bundled_grantees.len(),
        overlaps.len()
    );

    let tax_years: BTreeSet<i32> = grants.values().flatten().map(|g| g.tax_year).collect();
    Ok(BundlingResult {
        total_foundations_analyzed: foundation_ids.len(),
        foundation_ids,
        excluded_foundations: Vec::new(),
        tax_years: tax_years.into_iter().collect(),
        min_foundations,
        total_grantees: aggregated.len(),
        bundled_grantees,
        overlaps,
        thematic_clusters,
        statistics,
        processing_time_ms: started.elapsed().as_millis() as u64,
        analyzed_at: Utc::now(),
        aggregated,
    })
}

/// Co-funding analysis of a bundling result
pub fn analyze_cofunding(
    bundling: &BundlingResult,
    options: &CoFundingOptions,
    config: &AnalysisConfig,
) -> AnalysisResult<CoFundingResult> {
    let started = Instant::now();
    if options.similarity_threshold.is_nan() || options.similarity_threshold < 0.0 {
        return Err(AnalysisError::InvalidParameter {
            name: "similarity_threshold",
            reason: format!("must be a non-negative number, got {}", options.similarity_threshold),
        });
    }

    let similarities = similarities_for(bundling, config);
    let network = build_network(&similarities, options.similarity_threshold, network_settings(config));

    let recommend_options = RecommendOptions {
        known_foundations: options.known_foundations.iter().cloned().collect(),
        max_recommendations: options.max_recommendations,
        peer_min_score: config.peer_min_score,
        peer_high_priority_score: config.peer_high_priority_score,
        cluster_min_members: config.cluster_min_members,
        cluster_max_recommendations: config.cluster_max_recommendations,
    };
    let recommendations = network.recommend(&bundling.bundled_grantees, &recommend_options);

    info!(
        "Co-funding complete: {} similar pairs, {} above {:.2}, {} recommendations",
        similarities.len(),
        network.similarities.len(),
        options.similarity_threshold,
        recommendations.len()
    );

    let CoFundingNetwork {
        similarities: above_threshold,
        stats,
        peer_groups,
        snapshot,
        ..
    } = network;

    Ok(CoFundingResult {
        similarity_threshold: options.similarity_threshold,
        similarities,
        above_threshold,
        peer_groups,
        network: snapshot,
        network_stats: stats,
        recommendations,
        processing_time_ms: started.elapsed().as_millis() as u64,
        analyzed_at: Utc::now(),
    })
}

fn similarities_for(bundling: &BundlingResult, config: &AnalysisConfig) -> Vec<FunderSimilarity> {
    compute_similarities(
        &bundling.overlaps,
        &bundling.aggregated,
        SimilarityParams {
            recency_window_years: config.recency_window_years,
            recency_boost: config.recency_boost,
            theme_limit: config.max_purpose_keywords,
        },
    )
}

fn network_settings(config: &AnalysisConfig) -> NetworkSettings {
    NetworkSettings {
        community_seed: config.community_seed,
        bridge_betweenness_threshold: config.bridge_betweenness_threshold,
    }
}

fn statistics(
    grants: &GrantsByFoundation,
    aggregated: &AggregatedRecipients,
    bundled: &[BundledGrantee],
) -> BundlingStatistics {
    let records: Vec<&GrantRecord> = grants.values().flatten().collect();
    let foundations = grants.len().max(1) as f64;
    let total_funding: f64 = records.iter().map(|r| r.effective_amount()).sum();

    let unresolved_grants = records.iter().filter(|r| canonical_key(r).is_none()).count();
    let completeness = if records.is_empty() {
        0.0
    } else {
        records
            .iter()
            .map(|r| {
                if canonical_key(r).is_none() {
                    return 0.0;
                }
                let present = [
                    r.normalized_ein().is_some(),
                    r.effective_amount() > 0.0,
                    r.purpose_text().is_some(),
                ];
                present.iter().filter(|p| **p).count() as f64 / present.len() as f64
            })
            .sum::<f64>()
            / records.len() as f64
    };
    let ein_match_confidence = if aggregated.is_empty() {
        0.0
    } else {
        aggregated.keys().filter(|k| k.is_ein()).count() as f64 / aggregated.len() as f64
    };

    let funder_total: usize = bundled.iter().map(|g| g.funder_count).sum();

    BundlingStatistics {
        total_grants_analyzed: records.len(),
        total_funding,
        avg_grants_per_foundation: records.len() as f64 / foundations,
        avg_funding_per_foundation: total_funding / foundations,
        bundled_funding: bundled.iter().map(|g| g.total_funding).sum(),
        avg_funders_per_bundled_grantee: if bundled.is_empty() {
            0.0
        } else {
            funder_total as f64 / bundled.len() as f64
        },
        data_quality: DataQuality {
            completeness,
            ein_match_confidence,
            unresolved_grants,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryGrantStore;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn store() -> InMemoryGrantStore {
        InMemoryGrantStore::from_records(vec![
            GrantRecord::new("a", "Alpha", "Shared", 1_000.0, 2022).with_ein("111111111").with_purpose("arts"),
            GrantRecord::new("b", "Beta", "Shared Inc", 3_000.0, 2022).with_ein("111-11-1111"),
            GrantRecord::new("b", "Beta", "Only Beta", 500.0, 2022),
        ])
    }

    #[tokio::test]
    async fn test_statistics_and_quality() {
        let analyzer = GrantAnalyzer::new(Arc::new(store()));
        let result = analyzer.analyze_bundling(&ids(&["a", "b"]), &[2022], 2).await.unwrap();

        assert_eq!(result.total_foundations_analyzed, 2);
        assert_eq!(result.total_grantees, 2);
        assert_eq!(result.bundled_grantees.len(), 1);
        let stats = &result.statistics;
        assert_eq!(stats.total_grants_analyzed, 3);
        assert_eq!(stats.total_funding, 4_500.0);
        assert_eq!(stats.avg_grants_per_foundation, 1.5);
        assert_eq!(stats.bundled_funding, 4_000.0);
        assert_eq!(stats.avg_funders_per_bundled_grantee, 2.0);
        // (3/3 + 2/3 + 1/3) / 3
        assert!((stats.data_quality.completeness - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.data_quality.ein_match_confidence, 0.5);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let analyzer = GrantAnalyzer::new(Arc::new(store()));
        let err = analyzer.analyze_bundling(&ids(&["a", "a"]), &[2022], 2).await.unwrap_err();
        assert_eq!(err.to_string(), "at least 2 foundation ids required (got 1)");

        assert!(matches!(
            analyzer.analyze_bundling(&ids(&["a", "b"]), &[], 2).await,
            Err(AnalysisError::MissingTaxYears)
        ));
        assert!(matches!(
            analyzer.analyze_bundling(&ids(&["a", "b"]), &[2022], 0).await,
            Err(AnalysisError::InvalidParameter { name: "min_foundations", .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_foundation_excluded() {
        let analyzer = GrantAnalyzer::new(Arc::new(store()));
        let result = analyzer
            .analyze_bundling(&ids(&["a", "b", "ghost"]), &[2022], 2)
            .await
            .unwrap();
        assert_eq!(result.excluded_foundations, vec!["ghost"]);
        assert_eq!(result.foundation_ids, vec!["a", "b"]);

        let err = analyzer.analyze_bundling(&ids(&["a", "ghost"]), &[2022], 2).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientFoundations { supplied: 1, .. }));
    }

    #[tokio::test]
    async fn test_cofunding_rejects_bad_threshold() {
        let analyzer = GrantAnalyzer::new(Arc::new(store()));
        let bundling = analyzer.analyze_bundling(&ids(&["a", "b"]), &[2022], 2).await.unwrap();
        assert!(matches!(
            analyzer.analyze_cofunding(&bundling, f64::NAN, 10),
            Err(AnalysisError::InvalidParameter { name: "similarity_threshold", .. })
        ));
    }
}
