//! Thematic clustering of bundled grantees by shared purpose keywords

use super::detector::BundledGrantee;
use crate::grants::CanonicalRecipientKey;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Bundled grantees sharing a purpose keyword
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThematicCluster {
    pub theme: String,
    pub grantee_keys: Vec<CanonicalRecipientKey>,
    pub grantee_count: usize,
    pub total_funding: f64,
    pub foundations: Vec<String>,
}

/// One cluster per keyword, ranked by grantee count then keyword, at most `max_clusters`.
pub fn cluster(bundled: &[BundledGrantee], max_clusters: usize) -> Vec<ThematicCluster> {
    let mut themes: BTreeMap<&str, Vec<&BundledGrantee>> = BTreeMap::new();
    for grantee in bundled {
        for keyword in &grantee.common_purpose_keywords {
            themes.entry(keyword.as_str()).or_default().push(grantee);
        }
    }

    let mut ranked: Vec<(&str, Vec<&BundledGrantee>)> = themes.into_iter().collect();
    // Stable sort keeps the alphabetical order of the BTreeMap among equal counts
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    ranked
        .into_iter()
        .take(max_clusters)
        .map(|(theme, grantees)| {
            let mut grantee_keys: Vec<CanonicalRecipientKey> =
                grantees.iter().map(|g| g.recipient.key.clone()).collect();
            grantee_keys.sort();
            let foundations: BTreeSet<&str> = grantees
                .iter()
                .flat_map(|g| g.foundation_ids.iter().map(String::as_str))
                .collect();

            ThematicCluster {
                theme: theme.to_string(),
                grantee_count: grantee_keys.len(),
                grantee_keys,
                total_funding: grantees.iter().map(|g| g.total_funding).sum(),
                foundations: foundations.into_iter().map(str::to_string).collect(),
            }
        })
        .collect()
}
