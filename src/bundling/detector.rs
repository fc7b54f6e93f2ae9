//! Bundled-grantee detection and per-recipient funding metrics

use crate::grants::keywords::{token_counts, top_tokens};
use crate::grants::{AggregatedRecipient, AggregatedRecipients};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Consistency reported when only one year of data exists
const SINGLE_YEAR_CONSISTENCY: f64 = 0.5;

/// Consistency above which a non-monotonic history counts as stable
const STABLE_CONSISTENCY: f64 = 0.7;

/// Coarse trend of a recipient's year-over-year funding totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingStability {
    New,
    Growing,
    Stable,
    Declining,
    Sporadic,
}

/// A recipient funded by at least the run's minimum number of distinct foundations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundledGrantee {
    #[serde(flatten)]
    pub recipient: AggregatedRecipient,
    pub funder_count: usize,
    pub foundation_ids: Vec<String>,
    pub total_funding: f64,
    /// Mean amount per contributing grant
    pub average_funding: f64,
    pub first_year: i32,
    pub last_year: i32,
    pub funding_consistency: f64,
    pub stability: FundingStability,
    pub common_purpose_keywords: Vec<String>,
    pub purpose_diversity: f64,
    pub cofunding_strength: f64,
}

/// Keep recipients with at least `min_foundations` distinct funders and compute their metrics.
///
/// A `min_foundations` of zero behaves as one. The result is ordered by funder count
/// (descending), total funding (descending), then canonical key.
pub fn detect(aggregated: &AggregatedRecipients, min_foundations: usize, keyword_limit: usize) -> Vec<BundledGrantee> {
    let min_foundations = min_foundations.max(1);
    let mut bundled: Vec<BundledGrantee> = aggregated
        .values()
        .filter(|r| r.foundation_ids().len() >= min_foundations)
        .map(|r| summarize(r, keyword_limit))
        .collect();

    bundled.sort_by(|a, b| {
        b.funder_count
            .cmp(&a.funder_count)
            .then_with(|| b.total_funding.total_cmp(&a.total_funding))
            .then_with(|| a.recipient.key.cmp(&b.recipient.key))
    });

    debug!(
        "Detected {} bundled grantees among {} recipients (min_foundations = {})",
        bundled.len(),
        aggregated.len(),
        min_foundations
    );
    bundled
}

fn summarize(recipient: &AggregatedRecipient, keyword_limit: usize) -> BundledGrantee {
    let foundation_ids: Vec<String> = recipient.foundation_ids().into_iter().map(str::to_string).collect();
    let total_funding = recipient.total_amount();
    let first_year = recipient.years.first().copied().unwrap_or_default();
    let last_year = recipient.years.last().copied().unwrap_or_default();

    let funding_consistency = funding_consistency(&recipient.years);
    let yearly = yearly_totals(recipient);
    let stability = classify_stability(&yearly, first_year, last_year, funding_consistency);

    let purposes: Vec<&str> = recipient.sources.iter().filter_map(|s| s.purpose.as_deref()).collect();
    let counts = token_counts(purposes.iter().copied());
    let common_purpose_keywords = top_tokens(&counts, 2, keyword_limit);

    BundledGrantee {
        funder_count: foundation_ids.len(),
        foundation_ids,
        total_funding,
        average_funding: if recipient.sources.is_empty() {
            0.0
        } else {
            total_funding / recipient.sources.len() as f64
        },
        first_year,
        last_year,
        funding_consistency,
        stability,
        common_purpose_keywords,
        purpose_diversity: purpose_diversity(&purposes),
        cofunding_strength: cofunding_strength(recipient),
        recipient: recipient.clone(),
    }
}

/// Distinct funded years over the inclusive year span; 0.5 with a single year of data
pub fn funding_consistency(years: &BTreeSet<i32>) -> f64 {
    match (years.first(), years.last()) {
        (Some(&first), Some(&last)) if years.len() > 1 => years.len() as f64 / (last - first + 1) as f64,
        _ => SINGLE_YEAR_CONSISTENCY,
    }
}

fn yearly_totals(recipient: &AggregatedRecipient) -> Vec<f64> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for source in &recipient.sources {
        *totals.entry(source.tax_year).or_insert(0.0) += source.amount;
    }
    totals.into_values().collect()
}

/// Monotonicity checks run before the consistency fallback
pub fn classify_stability(yearly_totals: &[f64], first_year: i32, last_year: i32, consistency: f64) -> FundingStability {
    if yearly_totals.len() <= 1 || last_year - first_year <= 1 {
        return FundingStability::New;
    }
    if yearly_totals.windows(2).all(|w| w[0] <= w[1]) {
        FundingStability::Growing
    } else if yearly_totals.windows(2).all(|w| w[0] >= w[1]) {
        FundingStability::Declining
    } else if consistency > STABLE_CONSISTENCY {
        FundingStability::Stable
    } else {
        FundingStability::Sporadic
    }
}

/// Distinct purposes over sources carrying a purpose
fn purpose_diversity(purposes: &[&str]) -> f64 {
    if purposes.is_empty() {
        return 0.0;
    }
    let distinct: BTreeSet<String> = purposes.iter().map(|p| p.trim().to_lowercase()).collect();
    distinct.len() as f64 / purposes.len() as f64
}

/// Fraction of funded years in which at least two distinct foundations contributed
fn cofunding_strength(recipient: &AggregatedRecipient) -> f64 {
    if recipient.years.is_empty() {
        return 0.0;
    }
    let mut funders_by_year: BTreeMap<i32, BTreeSet<&str>> = BTreeMap::new();
    for source in &recipient.sources {
        funders_by_year
            .entry(source.tax_year)
            .or_default()
            .insert(source.foundation_id.as_str());
    }
    let cofunded = funders_by_year.values().filter(|f| f.len() >= 2).count();
    cofunded as f64 / recipient.years.len() as f64
}
