//! Prospecting recommendations from peer pairs and peer groups
//!
//! Peer-pair and cluster-member recommendations are produced by independent passes
//! and merged into one ranked list. A foundation may appear once per rationale.

use super::builder::{CoFundingNetwork, PeerFunderGroup};
use super::similarity::FunderSimilarity;
use crate::bundling::BundledGrantee;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Confidence discount applied to cluster-member evidence relative to a direct pair
const CLUSTER_CONFIDENCE_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    PeerFunder,
    ClusterMember,
}

/// Coarse ranking tier; `High` sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A foundation worth prospecting, with the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunderRecommendation {
    pub foundation_id: String,
    pub foundation_name: String,
    pub recommendation_type: RecommendationType,
    pub priority: Priority,
    pub confidence: f64,
    pub evidence: Vec<String>,
    /// Already-known foundations that justify the recommendation
    pub justified_by: Vec<String>,
}

/// Requester context and limits for one recommendation pass
#[derive(Debug, Clone)]
pub struct RecommendOptions {
    /// Foundations the requester already works with
    pub known_foundations: BTreeSet<String>,
    pub max_recommendations: usize,
    pub peer_min_score: f64,
    pub peer_high_priority_score: f64,
    pub cluster_min_members: usize,
    pub cluster_max_recommendations: usize,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            known_foundations: BTreeSet::new(),
            max_recommendations: 10,
            peer_min_score: 0.5,
            peer_high_priority_score: 0.7,
            cluster_min_members: 3,
            cluster_max_recommendations: 5,
        }
    }
}

impl CoFundingNetwork {
    /// Recommendations from this network's edges and peer groups
    pub fn recommend(&self, bundled: &[BundledGrantee], options: &RecommendOptions) -> Vec<FunderRecommendation> {
        recommend(&self.similarities, &self.peer_groups, bundled, options)
    }
}

/// Ranked recommendations, at most `options.max_recommendations`.
///
/// Sorted by priority tier, then confidence (both descending), then foundation id.
pub fn recommend(
    similarities: &[FunderSimilarity],
    peer_groups: &[PeerFunderGroup],
    bundled: &[BundledGrantee],
    options: &RecommendOptions,
) -> Vec<FunderRecommendation> {
    let names = names_from(similarities);
    let bundled_counts = bundled_counts(bundled);

    let mut recommendations = peer_recommendations(similarities, &bundled_counts, options);
    recommendations.extend(cluster_recommendations(peer_groups, &names, &bundled_counts, options));

    recommendations.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.foundation_id.cmp(&b.foundation_id))
    });
    recommendations.truncate(options.max_recommendations);
    recommendations
}

fn peer_recommendations(
    similarities: &[FunderSimilarity],
    bundled_counts: &BTreeMap<&str, usize>,
    options: &RecommendOptions,
) -> Vec<FunderRecommendation> {
    let mut ranked: Vec<&FunderSimilarity> = similarities.iter().collect();
    ranked.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));

    ranked
        .into_iter()
        .filter(|s| s.combined_score >= options.peer_min_score)
        .filter_map(|s| {
            let o = &s.overlap;
            let (target, target_name, anchor, anchor_name) = match pick_side(s, &options.known_foundations)? {
                Side::B => (&o.foundation_b, &o.foundation_b_name, &o.foundation_a, &o.foundation_a_name),
                Side::A => (&o.foundation_a, &o.foundation_a_name, &o.foundation_b, &o.foundation_b_name),
            };

            let mut evidence = vec![
                format!("Shares {} recipients with {}", o.shared_count, anchor_name),
                format!("${:.0} co-funded to shared recipients", s.cofunding_amount),
            ];
            if !s.common_themes.is_empty() {
                evidence.push(format!("Common themes: {}", s.common_themes.join(", ")));
            }
            if let Some(count) = bundled_counts.get(target.as_str()) {
                evidence.push(format!("Funds {} bundled grantees", count));
            }

            Some(FunderRecommendation {
                foundation_id: target.clone(),
                foundation_name: target_name.clone(),
                recommendation_type: RecommendationType::PeerFunder,
                priority: if s.combined_score > options.peer_high_priority_score {
                    Priority::High
                } else {
                    Priority::Medium
                },
                confidence: s.combined_score.clamp(0.0, 1.0),
                evidence,
                justified_by: vec![anchor.clone()],
            })
        })
        .take(options.max_recommendations)
        .collect()
}

enum Side {
    A,
    B,
}

/// Which side of a pair to recommend. With no known foundations the second id is
/// recommended; otherwise exactly one side must already be known.
fn pick_side(similarity: &FunderSimilarity, known: &BTreeSet<String>) -> Option<Side> {
    if known.is_empty() {
        return Some(Side::B);
    }
    match (
        known.contains(similarity.foundation_a()),
        known.contains(similarity.foundation_b()),
    ) {
        (true, false) => Some(Side::B),
        (false, true) => Some(Side::A),
        _ => None,
    }
}

fn cluster_recommendations(
    peer_groups: &[PeerFunderGroup],
    names: &BTreeMap<&str, &str>,
    bundled_counts: &BTreeMap<&str, usize>,
    options: &RecommendOptions,
) -> Vec<FunderRecommendation> {
    let mut out = Vec::new();
    for group in peer_groups.iter().filter(|g| g.member_count >= options.cluster_min_members) {
        let justified_by: Vec<String> = group
            .foundations
            .iter()
            .filter(|f| options.known_foundations.contains(*f))
            .cloned()
            .collect();

        let mut candidates: Vec<&String> = group
            .foundations
            .iter()
            .filter(|f| !options.known_foundations.contains(*f))
            .collect();
        candidates.sort_by(|a, b| {
            let ca = bundled_counts.get(a.as_str()).copied().unwrap_or(0);
            let cb = bundled_counts.get(b.as_str()).copied().unwrap_or(0);
            cb.cmp(&ca).then_with(|| a.cmp(b))
        });

        for foundation in candidates.into_iter().take(options.cluster_max_recommendations) {
            let mut evidence = vec![
                format!("Member of a peer group of {} foundations", group.member_count),
                format!("Peer group density {:.2}", group.cluster_density),
            ];
            if group.bridge_foundations.contains(foundation) {
                evidence.push("Bridges sub-groups within its peer group".to_string());
            }
            if let Some(count) = bundled_counts.get(foundation.as_str()) {
                evidence.push(format!("Funds {} bundled grantees", count));
            }

            out.push(FunderRecommendation {
                foundation_id: foundation.clone(),
                foundation_name: names.get(foundation.as_str()).map_or_else(|| foundation.clone(), |n| n.to_string()),
                recommendation_type: RecommendationType::ClusterMember,
                priority: Priority::Medium,
                confidence: (group.cluster_density * CLUSTER_CONFIDENCE_FACTOR).clamp(0.0, 1.0),
                evidence,
                justified_by: justified_by.clone(),
            });
        }
    }
    out
}

fn names_from(similarities: &[FunderSimilarity]) -> BTreeMap<&str, &str> {
    let mut names = BTreeMap::new();
    for s in similarities {
        let o = &s.overlap;
        names.insert(o.foundation_a.as_str(), o.foundation_a_name.as_str());
        names.insert(o.foundation_b.as_str(), o.foundation_b_name.as_str());
    }
    names
}

/// Number of bundled grantees each foundation funds
fn bundled_counts(bundled: &[BundledGrantee]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for grantee in bundled {
        for f in &grantee.foundation_ids {
            *counts.entry(f.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundling::FoundationOverlap;

    fn similarity(a: &str, b: &str, score: f64) -> FunderSimilarity {
        FunderSimilarity {
            overlap: FoundationOverlap {
                foundation_a: a.to_string(),
                foundation_a_name: a.to_uppercase(),
                foundation_b: b.to_string(),
                foundation_b_name: b.to_uppercase(),
                shared_count: 3,
                shared_recipients: Vec::new(),
                union_size: 6,
                jaccard_similarity: score,
                overlap_pct_a: 0.5,
                overlap_pct_b: 0.5,
            },
            recency_score: 0.0,
            combined_score: score,
            cofunding_amount: 12_000.0,
            common_themes: vec!["education".to_string()],
        }
    }

    fn group(members: &[&str], density: f64) -> PeerFunderGroup {
        PeerFunderGroup {
            group_id: 0,
            foundations: members.iter().map(|s| s.to_string()).collect(),
            member_count: members.len(),
            intra_group_funding: 0.0,
            cluster_density: density,
            average_similarity: 0.5,
            bridge_foundations: Vec::new(),
        }
    }

    #[test]
    fn test_peer_priorities_and_floor() {
        let sims = vec![similarity("a", "b", 0.8), similarity("a", "c", 0.6), similarity("a", "d", 0.4)];
        let recs = recommend(&sims, &[], &[], &RecommendOptions::default());

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].foundation_id, "b");
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[0].justified_by, vec!["a"]);
        assert_eq!(recs[1].foundation_id, "c");
        assert_eq!(recs[1].priority, Priority::Medium);
        assert!(recs[0].evidence.iter().any(|e| e.contains("education")));
    }

    #[test]
    fn test_known_foundations_pick_unknown_side() {
        let sims = vec![similarity("a", "b", 0.9), similarity("c", "d", 0.9), similarity("b", "e", 0.6)];
        let options = RecommendOptions {
            known_foundations: ["b".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let recs = recommend(&sims, &[], &[], &options);
        let ids: Vec<&str> = recs.iter().map(|r| r.foundation_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e"]);
        assert!(recs.iter().all(|r| r.justified_by == vec!["b"]));
    }

    #[test]
    fn test_unanchored_pairs_do_not_consume_top_slots() {
        let sims = vec![
            similarity("c", "d", 0.95),
            similarity("e", "f", 0.9),
            similarity("a", "b", 0.6),
            similarity("a", "g", 0.55),
        ];
        let options = RecommendOptions {
            known_foundations: ["a".to_string()].into_iter().collect(),
            max_recommendations: 2,
            ..Default::default()
        };
        let recs = recommend(&sims, &[], &[], &options);
        let ids: Vec<&str> = recs.iter().map(|r| r.foundation_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "g"]);
    }

    #[test]
    fn test_cluster_members_not_deduplicated() {
        let sims = vec![similarity("a", "b", 0.6)];
        let groups = vec![group(&["a", "b", "c", "x"], 0.5), group(&["y", "z"], 1.0)];
        let options = RecommendOptions {
            known_foundations: ["a".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let recs = recommend(&sims, &groups, &[], &options);

        let b_types: Vec<RecommendationType> = recs
            .iter()
            .filter(|r| r.foundation_id == "b")
            .map(|r| r.recommendation_type)
            .collect();
        assert_eq!(b_types, vec![RecommendationType::PeerFunder, RecommendationType::ClusterMember]);
        assert_eq!(recs.len(), 4);
        assert!(recs.iter().all(|r| r.foundation_id != "a" && r.foundation_id != "y"));
        let cluster = recs.iter().find(|r| r.foundation_id == "x").unwrap();
        assert_eq!(cluster.confidence, 0.4);
        assert_eq!(cluster.justified_by, vec!["a"]);
    }

    #[test]
    fn test_cap_and_ordering() {
        let sims: Vec<FunderSimilarity> = (0..8).map(|i| similarity("a", &format!("f{i}"), 0.5 + i as f64 * 0.05)).collect();
        let options = RecommendOptions {
            max_recommendations: 3,
            ..Default::default()
        };
        let recs = recommend(&sims, &[], &[], &options);
        assert_eq!(recs.len(), 3);
        for pair in recs.windows(2) {
            assert!(pair[0].priority > pair[1].priority || pair[0].confidence >= pair[1].confidence);
        }
    }
}
