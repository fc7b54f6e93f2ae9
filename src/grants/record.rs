//! Grant record and recipient identity types

use crate::config::SizeTierBounds;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// One disbursement line reported by one foundation in one filing year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub foundation_id: String,
    pub foundation_name: String,
    #[serde(default)]
    pub recipient_ein: Option<String>,
    pub recipient_name: String,
    #[serde(default)]
    pub amount: Option<f64>,
    pub tax_year: i32,
    #[serde(default)]
    pub purpose: Option<String>,
}

impl GrantRecord {
    pub fn new(
        foundation_id: impl Into<String>,
        foundation_name: impl Into<String>,
        recipient_name: impl Into<String>,
        amount: f64,
        tax_year: i32,
    ) -> Self {
        Self {
            foundation_id: foundation_id.into(),
            foundation_name: foundation_name.into(),
            recipient_ein: None,
            recipient_name: recipient_name.into(),
            amount: Some(amount),
            tax_year,
            purpose: None,
        }
    }

    pub fn with_ein(mut self, ein: impl Into<String>) -> Self {
        self.recipient_ein = Some(ein.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Amount usable in sums: missing, negative and NaN amounts count as zero
    pub fn effective_amount(&self) -> f64 {
        match self.amount {
            Some(a) if a > 0.0 => a,
            _ => 0.0,
        }
    }

    /// The recipient EIN as nine digits, if one is present and well-formed
    pub fn normalized_ein(&self) -> Option<String> {
        let digits: String = self
            .recipient_ein
            .as_deref()?
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        (digits.len() == 9).then_some(digits)
    }

    pub fn purpose_text(&self) -> Option<&str> {
        self.purpose.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Deduplication identity of a grant recipient
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalRecipientKey {
    /// Nine-digit EIN
    Ein(String),
    /// Normalized recipient name
    Name(String),
}

impl CanonicalRecipientKey {
    pub fn is_ein(&self) -> bool {
        matches!(self, CanonicalRecipientKey::Ein(_))
    }
}

impl fmt::Display for CanonicalRecipientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalRecipientKey::Ein(ein) => write!(f, "ein:{}", ein),
            CanonicalRecipientKey::Name(name) => write!(f, "name:{}", name),
        }
    }
}

impl Serialize for CanonicalRecipientKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Coarse grant size classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
    Major,
}

impl SizeTier {
    pub fn classify(amount: f64, bounds: &SizeTierBounds) -> Self {
        if amount < bounds.small {
            SizeTier::Small
        } else if amount < bounds.medium {
            SizeTier::Medium
        } else if amount < bounds.large {
            SizeTier::Large
        } else {
            SizeTier::Major
        }
    }
}

/// One contributing grant attached to an aggregated recipient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingSource {
    pub foundation_id: String,
    pub foundation_name: String,
    pub amount: f64,
    pub tax_year: i32,
    pub purpose: Option<String>,
    pub size_tier: SizeTier,
}

impl FundingSource {
    pub fn from_record(record: &GrantRecord, bounds: &SizeTierBounds) -> Self {
        let amount = record.effective_amount();
        Self {
            foundation_id: record.foundation_id.clone(),
            foundation_name: record.foundation_name.clone(),
            amount,
            tax_year: record.tax_year,
            purpose: record.purpose_text().map(str::to_string),
            size_tier: SizeTier::classify(amount, bounds),
        }
    }
}

/// A distinct recipient with every grant it received in the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecipient {
    pub key: CanonicalRecipientKey,
    pub display_name: String,
    pub sources: Vec<FundingSource>,
    pub years: BTreeSet<i32>,
}

impl AggregatedRecipient {
    pub fn new(key: CanonicalRecipientKey, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
            sources: Vec::new(),
            years: BTreeSet::new(),
        }
    }

    pub fn push(&mut self, source: FundingSource) {
        self.years.insert(source.tax_year);
        self.sources.push(source);
    }

    /// Distinct contributing foundation ids
    pub fn foundation_ids(&self) -> BTreeSet<&str> {
        self.sources.iter().map(|s| s.foundation_id.as_str()).collect()
    }

    pub fn total_amount(&self) -> f64 {
        self.sources.iter().map(|s| s.amount).sum()
    }

    /// Whether `foundation_id` funded this recipient in any year `>= since`
    pub fn funded_by_since(&self, foundation_id: &str, since: i32) -> bool {
        self.sources
            .iter()
            .any(|s| s.foundation_id == foundation_id && s.tax_year >= since)
    }

    /// Sum of grants from `foundation_id`
    pub fn amount_from(&self, foundation_id: &str) -> f64 {
        self.sources
            .iter()
            .filter(|s| s.foundation_id == foundation_id)
            .map(|s| s.amount)
            .sum()
    }
}
