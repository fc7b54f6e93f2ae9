//! In-process grant store

use super::{GrantStore, StoreError, StoreResult};
use crate::grants::GrantRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Grant records held in memory, indexed by foundation and tax year
#[derive(Default)]
pub struct InMemoryGrantStore {
    records: RwLock<BTreeMap<String, BTreeMap<i32, Vec<GrantRecord>>>>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = GrantRecord>) -> Self {
        let mut index: BTreeMap<String, BTreeMap<i32, Vec<GrantRecord>>> = BTreeMap::new();
        for record in records {
            index
                .entry(record.foundation_id.clone())
                .or_default()
                .entry(record.tax_year)
                .or_default()
                .push(record);
        }
        Self {
            records: RwLock::new(index),
        }
    }

    pub async fn insert(&self, record: GrantRecord) {
        let mut records = self.records.write().await;
        records
            .entry(record.foundation_id.clone())
            .or_default()
            .entry(record.tax_year)
            .or_default()
            .push(record);
    }

    /// Register a foundation with no grants, so fetches return empty lists rather than errors
    pub async fn register_foundation(&self, foundation_id: &str) {
        self.records.write().await.entry(foundation_id.to_string()).or_default();
    }

    pub async fn foundation_ids(&self) -> Vec<String> {
        self.records.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn fetch_grants(&self, foundation_id: &str, tax_year: i32) -> StoreResult<Vec<GrantRecord>> {
        let records = self.records.read().await;
        let by_year = records
            .get(foundation_id)
            .ok_or_else(|| StoreError::FoundationNotFound(foundation_id.to_string()))?;
        let grants = by_year.get(&tax_year).cloned().unwrap_or_default();
        debug!("Fetched {} grants for {} ({})", grants.len(), foundation_id, tax_year);
        Ok(grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_by_foundation_and_year() {
        let store = InMemoryGrantStore::from_records(vec![
            GrantRecord::new("f1", "F1", "Acme", 100.0, 2022),
            GrantRecord::new("f1", "F1", "Beta", 200.0, 2023),
        ]);
        store.insert(GrantRecord::new("f1", "F1", "Gamma", 300.0, 2022)).await;

        assert_eq!(store.fetch_grants("f1", 2022).await.unwrap().len(), 2);
        assert!(store.fetch_grants("f1", 2019).await.unwrap().is_empty());
        assert!(matches!(
            store.fetch_grants("nope", 2022).await,
            Err(StoreError::FoundationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_registered_foundation_without_grants() {
        let store = InMemoryGrantStore::new();
        store.register_foundation("empty").await;
        assert!(store.fetch_grants("empty", 2022).await.unwrap().is_empty());
        assert_eq!(store.foundation_ids().await, vec!["empty"]);
    }
}
