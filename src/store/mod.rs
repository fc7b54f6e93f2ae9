//! Storage collaborator seam
//!
//! Grant records are fetched per `(foundation_id, tax_year)`. Implementations:
//! - `InMemoryGrantStore` — records held in process (tests, embedding)
//! - `JsonGrantStore` — records loaded from a JSON array on disk

pub mod json;
pub mod memory;

pub use json::JsonGrantStore;
pub use memory::InMemoryGrantStore;

use crate::grants::GrantRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a grant store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store has no data at all for this foundation
    #[error("Foundation {0} not found")]
    FoundationNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only access to grant records by foundation and tax year
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Grants reported by `foundation_id` for `tax_year`.
    ///
    /// A known foundation with no grants in that year yields an empty list.
    async fn fetch_grants(&self, foundation_id: &str, tax_year: i32) -> StoreResult<Vec<GrantRecord>>;
}
