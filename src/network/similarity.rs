//! Recency-weighted foundation similarity

use crate::bundling::FoundationOverlap;
use crate::grants::keywords::{shared_tokens, token_counts};
use crate::grants::AggregatedRecipients;
use rayon::prelude::*;
use serde::Serialize;

/// A foundation overlap refined with recency, co-funding volume and shared themes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunderSimilarity {
    #[serde(flatten)]
    pub overlap: FoundationOverlap,
    /// Fraction of shared recipients funded by both foundations within the recency window
    pub recency_score: f64,
    /// `jaccard × (1 + recency_score × recency_boost)`
    pub combined_score: f64,
    /// Both foundations' grants to their shared recipients
    pub cofunding_amount: f64,
    pub common_themes: Vec<String>,
}

impl FunderSimilarity {
    pub fn foundation_a(&self) -> &str {
        &self.overlap.foundation_a
    }

    pub fn foundation_b(&self) -> &str {
        &self.overlap.foundation_b
    }
}

/// Parameters of the similarity refinement
#[derive(Debug, Clone, Copy)]
pub struct SimilarityParams {
    pub recency_window_years: i32,
    pub recency_boost: f64,
    pub theme_limit: usize,
}

/// Combined similarity score
pub fn combined_score(jaccard: f64, recency_score: f64, recency_boost: f64) -> f64 {
    jaccard * (1.0 + recency_score * recency_boost)
}

/// Refine every overlap; ordered by combined score (descending) then foundation ids.
///
/// The recency window ends at the latest tax year present in `aggregated`.
pub fn compute_similarities(
    overlaps: &[FoundationOverlap],
    aggregated: &AggregatedRecipients,
    params: SimilarityParams,
) -> Vec<FunderSimilarity> {
    let latest_year = aggregated
        .values()
        .filter_map(|r| r.years.last().copied())
        .max()
        .unwrap_or_default();
    let recent_since = latest_year - (params.recency_window_years - 1);

    let mut similarities: Vec<FunderSimilarity> = overlaps
        .par_iter()
        .map(|overlap| refine(overlap, aggregated, recent_since, params))
        .collect();

    similarities.sort_by(|x, y| {
        y.combined_score
            .total_cmp(&x.combined_score)
            .then_with(|| x.foundation_a().cmp(y.foundation_a()))
            .then_with(|| x.foundation_b().cmp(y.foundation_b()))
    });
    similarities
}

fn refine(
    overlap: &FoundationOverlap,
    aggregated: &AggregatedRecipients,
    recent_since: i32,
    params: SimilarityParams,
) -> FunderSimilarity {
    let (a, b) = (overlap.foundation_a.as_str(), overlap.foundation_b.as_str());
    let mut recent = 0usize;
    let mut cofunding_amount = 0.0;
    let mut purposes_a = Vec::new();
    let mut purposes_b = Vec::new();

    for recipient in overlap.shared_recipients.iter().filter_map(|k| aggregated.get(k)) {
        if recipient.funded_by_since(a, recent_since) && recipient.funded_by_since(b, recent_since) {
            recent += 1;
        }
        for source in &recipient.sources {
            if source.foundation_id == a {
                cofunding_amount += source.amount;
                purposes_a.extend(source.purpose.as_deref());
            } else if source.foundation_id == b {
                cofunding_amount += source.amount;
                purposes_b.extend(source.purpose.as_deref());
            }
        }
    }

    let recency_score = if overlap.shared_count > 0 {
        recent as f64 / overlap.shared_count as f64
    } else {
        0.0
    };
    let common_themes = shared_tokens(
        &token_counts(purposes_a),
        &token_counts(purposes_b),
        params.theme_limit,
    );

    FunderSimilarity {
        overlap: overlap.clone(),
        recency_score,
        combined_score: combined_score(overlap.jaccard_similarity, recency_score, params.recency_boost),
        cofunding_amount,
        common_themes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundling::build_overlaps;
    use crate::config::AnalysisConfig;
    use crate::grants::{aggregate, GrantRecord, GrantsByFoundation};

    fn params() -> SimilarityParams {
        SimilarityParams {
            recency_window_years: 2,
            recency_boost: 0.2,
            theme_limit: 5,
        }
    }

    #[test]
    fn test_recency_amount_and_themes() {
        let rows = [
            ("F1", "X", 2023, 100.0, "youth literacy"),
            ("F2", "X", 2022, 50.0, "literacy tutoring"),
            ("F1", "Y", 2019, 10.0, "food pantry"),
            ("F2", "Y", 2023, 20.0, "food pantry"),
            ("F1", "Z", 2023, 1.0, "parks"),
        ];
        let mut grants = GrantsByFoundation::new();
        for (f, r, y, amount, purpose) in rows {
            grants
                .entry(f.to_string())
                .or_default()
                .push(GrantRecord::new(f, f, r, amount, y).with_purpose(purpose));
        }
        let aggregated = aggregate(&grants, &AnalysisConfig::default());
        let overlaps = build_overlaps(&aggregated, &["F1".to_string(), "F2".to_string()], 1).unwrap();
        let sims = compute_similarities(&overlaps, &aggregated, params());

        assert_eq!(sims.len(), 1);
        let s = &sims[0];
        // X funded by both in 2022-2023; Y only by F2 recently
        assert_eq!(s.recency_score, 0.5);
        assert!((s.overlap.jaccard_similarity - 2.0 / 3.0).abs() < 1e-9);
        assert!((s.combined_score - (2.0 / 3.0) * 1.1).abs() < 1e-9);
        assert_eq!(s.cofunding_amount, 180.0);
        assert_eq!(s.common_themes, vec!["food", "literacy", "pantry"]);
    }

    #[test]
    fn test_combined_score() {
        assert_eq!(combined_score(0.5, 0.0, 0.2), 0.5);
        assert!((combined_score(0.5, 1.0, 0.2) - 0.6).abs() < 1e-12);
    }
}
