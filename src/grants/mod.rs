//! Grant records, recipient identity and aggregation

pub mod aggregate;
pub mod keywords;
pub mod normalize;
pub mod record;

pub use aggregate::{aggregate, canonical_key, AggregatedRecipients, GrantsByFoundation};
pub use normalize::normalize;
pub use record::{AggregatedRecipient, CanonicalRecipientKey, FundingSource, GrantRecord, SizeTier};
