//! Grouping of per-foundation grants by canonical recipient

use super::normalize::normalize;
use super::record::{AggregatedRecipient, CanonicalRecipientKey, FundingSource, GrantRecord};
use crate::config::AnalysisConfig;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Grants keyed by foundation id
pub type GrantsByFoundation = BTreeMap<String, Vec<GrantRecord>>;

/// Aggregated recipients, ordered by canonical key
pub type AggregatedRecipients = IndexMap<CanonicalRecipientKey, AggregatedRecipient>;

/// EIN key when the record carries a well-formed EIN, normalized-name key otherwise.
///
/// `None` when the record has no usable EIN and its name normalizes to nothing.
pub fn canonical_key(record: &GrantRecord) -> Option<CanonicalRecipientKey> {
    if let Some(ein) = record.normalized_ein() {
        return Some(CanonicalRecipientKey::Ein(ein));
    }
    let name = normalize(&record.recipient_name);
    (!name.is_empty()).then_some(CanonicalRecipientKey::Name(name))
}

/// Group every grant by canonical recipient.
///
/// An EIN-keyed and a name-keyed entry for the same organization stay separate.
/// Records without a canonical key are left out. Foundations are visited in id order
/// and records in input order, so the display name of a recipient is the first
/// spelling seen in that order.
pub fn aggregate(grants: &GrantsByFoundation, config: &AnalysisConfig) -> AggregatedRecipients {
    let mut groups: FxHashMap<CanonicalRecipientKey, AggregatedRecipient> = FxHashMap::default();
    let mut unresolved = 0usize;

    for records in grants.values() {
        for record in records {
            let Some(key) = canonical_key(record) else {
                unresolved += 1;
                continue;
            };
            groups
                .entry(key.clone())
                .or_insert_with(|| AggregatedRecipient::new(key, record.recipient_name.trim()))
                .push(FundingSource::from_record(record, &config.size_tiers));
        }
    }

    if let Some(threshold) = config.fuzzy_name_threshold {
        merge_similar_names(&mut groups, threshold);
    }

    let mut aggregated: AggregatedRecipients = groups.into_iter().collect();
    aggregated.sort_keys();
    if unresolved > 0 {
        warn!("Skipped {} grants with no EIN and no usable recipient name", unresolved);
    }
    debug!("Aggregated {} distinct recipients", aggregated.len());
    aggregated
}

#[cfg(feature = "fuzzy-matching")]
fn merge_similar_names(groups: &mut FxHashMap<CanonicalRecipientKey, AggregatedRecipient>, threshold: f64) {
    let mut names: Vec<String> = groups
        .keys()
        .filter_map(|k| match k {
            CanonicalRecipientKey::Name(n) => Some(n.clone()),
            _ => None,
        })
        .collect();
    names.sort();

    let mut anchors: Vec<String> = Vec::new();
    let mut merged = 0usize;
    for name in names {
        let target = anchors
            .iter()
            .find(|anchor| strsim::jaro_winkler(anchor, &name) >= threshold)
            .cloned();
        match target {
            Some(anchor) => {
                if let Some(absorbed) = groups.remove(&CanonicalRecipientKey::Name(name)) {
                    if let Some(into) = groups.get_mut(&CanonicalRecipientKey::Name(anchor)) {
                        for source in absorbed.sources {
                            into.push(source);
                        }
                        merged += 1;
                    }
                }
            }
            None => anchors.push(name),
        }
    }
    debug!("Fuzzy name matching merged {} recipients (threshold {})", merged, threshold);
}

#[cfg(not(feature = "fuzzy-matching"))]
fn merge_similar_names(_groups: &mut FxHashMap<CanonicalRecipientKey, AggregatedRecipient>, threshold: f64) {
    warn!(
        "fuzzy_name_threshold = {} ignored: built without the 'fuzzy-matching' feature",
        threshold
    );
}
