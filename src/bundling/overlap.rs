//! Pairwise foundation overlap (Jaccard) matrix

use crate::error::{AnalysisError, AnalysisResult};
use crate::grants::{AggregatedRecipients, CanonicalRecipientKey};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Recipient overlap between two foundations.
///
/// `foundation_a` sorts before `foundation_b`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundationOverlap {
    pub foundation_a: String,
    pub foundation_a_name: String,
    pub foundation_b: String,
    pub foundation_b_name: String,
    pub shared_count: usize,
    pub shared_recipients: Vec<CanonicalRecipientKey>,
    pub union_size: usize,
    pub jaccard_similarity: f64,
    /// Shared recipients as a fraction of `foundation_a`'s recipients
    pub overlap_pct_a: f64,
    /// Shared recipients as a fraction of `foundation_b`'s recipients
    pub overlap_pct_b: f64,
}

impl FoundationOverlap {
    /// Same overlap with the two foundations' labels exchanged
    pub fn swapped(&self) -> Self {
        Self {
            foundation_a: self.foundation_b.clone(),
            foundation_a_name: self.foundation_b_name.clone(),
            foundation_b: self.foundation_a.clone(),
            foundation_b_name: self.foundation_a_name.clone(),
            overlap_pct_a: self.overlap_pct_b,
            overlap_pct_b: self.overlap_pct_a,
            ..self.clone()
        }
    }

    pub fn involves(&self, foundation_id: &str) -> bool {
        self.foundation_a == foundation_id || self.foundation_b == foundation_id
    }
}

/// Display names of every foundation contributing to `aggregated`
pub fn foundation_names(aggregated: &AggregatedRecipients) -> BTreeMap<String, String> {
    let mut names = BTreeMap::new();
    for recipient in aggregated.values() {
        for source in &recipient.sources {
            names
                .entry(source.foundation_id.clone())
                .or_insert_with(|| source.foundation_name.clone());
        }
    }
    names
}

/// Recipient key sets per foundation
pub fn recipients_by_foundation(aggregated: &AggregatedRecipients) -> FxHashMap<&str, FxHashSet<&CanonicalRecipientKey>> {
    let mut sets: FxHashMap<&str, FxHashSet<&CanonicalRecipientKey>> = FxHashMap::default();
    for (key, recipient) in aggregated {
        for source in &recipient.sources {
            sets.entry(source.foundation_id.as_str()).or_default().insert(key);
        }
    }
    sets
}

/// One overlap per unordered foundation pair sharing at least one recipient.
///
/// Pairs are scored in parallel, at least `min_chunk` pairs per work item. The result is
/// ordered by shared count (descending), Jaccard (descending), then foundation ids.
pub fn build_overlaps(
    aggregated: &AggregatedRecipients,
    foundation_ids: &[String],
    min_chunk: usize,
) -> AnalysisResult<Vec<FoundationOverlap>> {
    let ids: Vec<&str> = foundation_ids
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if ids.len() < 2 {
        return Err(AnalysisError::InsufficientFoundations {
            required: 2,
            supplied: ids.len(),
        });
    }

    let sets = recipients_by_foundation(aggregated);
    let names = foundation_names(aggregated);
    let empty = FxHashSet::default();

    let pairs: Vec<(&str, &str)> = ids
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| ids[i + 1..].iter().map(move |&b| (a, b)))
        .collect();

    let mut overlaps: Vec<FoundationOverlap> = pairs
        .par_iter()
        .with_min_len(min_chunk.max(1))
        .filter_map(|&(a, b)| {
            let set_a = sets.get(a).unwrap_or(&empty);
            let set_b = sets.get(b).unwrap_or(&empty);
            let mut shared: Vec<CanonicalRecipientKey> =
                set_a.intersection(set_b).map(|k| (*k).clone()).collect();
            if shared.is_empty() {
                return None;
            }
            shared.sort();

            let shared_count = shared.len();
            let union_size = set_a.len() + set_b.len() - shared_count;
            Some(FoundationOverlap {
                foundation_a: a.to_string(),
                foundation_a_name: names.get(a).cloned().unwrap_or_else(|| a.to_string()),
                foundation_b: b.to_string(),
                foundation_b_name: names.get(b).cloned().unwrap_or_else(|| b.to_string()),
                shared_count,
                shared_recipients: shared,
                union_size,
                jaccard_similarity: shared_count as f64 / union_size as f64,
                overlap_pct_a: shared_count as f64 / set_a.len() as f64,
                overlap_pct_b: shared_count as f64 / set_b.len() as f64,
            })
        })
        .collect();

    overlaps.sort_by(|x, y| {
        y.shared_count
            .cmp(&x.shared_count)
            .then_with(|| y.jaccard_similarity.total_cmp(&x.jaccard_similarity))
            .then_with(|| x.foundation_a.cmp(&y.foundation_a))
            .then_with(|| x.foundation_b.cmp(&y.foundation_b))
    });

    debug!("Scored {} foundation pairs, {} with shared recipients", pairs.len(), overlaps.len());
    Ok(overlaps)
}
