//! Grant store backed by a JSON file

use super::{GrantStore, InMemoryGrantStore, StoreResult};
use crate::grants::GrantRecord;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Grant records loaded once from a JSON array of `GrantRecord` objects
pub struct JsonGrantStore {
    inner: InMemoryGrantStore,
    record_count: usize,
}

impl JsonGrantStore {
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let records: Vec<GrantRecord> = serde_json::from_str(json)?;
        let record_count = records.len();
        Ok(Self {
            inner: InMemoryGrantStore::from_records(records),
            record_count,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&text)?;
        info!("Loaded {} grant records from {:?}", store.record_count, path);
        Ok(store)
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub async fn foundation_ids(&self) -> Vec<String> {
        self.inner.foundation_ids().await
    }
}

#[async_trait]
impl GrantStore for JsonGrantStore {
    async fn fetch_grants(&self, foundation_id: &str, tax_year: i32) -> StoreResult<Vec<GrantRecord>> {
        self.inner.fetch_grants(foundation_id, tax_year).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"foundation_id": "f1", "foundation_name": "First", "recipient_name": "Acme",
         "recipient_ein": "12-3456789", "amount": 5000, "tax_year": 2022, "purpose": "arts"},
        {"foundation_id": "f2", "foundation_name": "Second", "recipient_name": "Acme", "tax_year": 2022}
    ]"#;

    #[tokio::test]
    async fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let store = JsonGrantStore::open(file.path()).unwrap();
        assert_eq!(store.record_count(), 2);
        assert_eq!(store.foundation_ids().await, vec!["f1", "f2"]);

        let grants = store.fetch_grants("f2", 2022).await.unwrap();
        assert_eq!(grants[0].amount, None);
        assert_eq!(grants[0].recipient_ein, None);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            JsonGrantStore::from_json_str("[{"),
            Err(StoreError::Serialization(_))
        ));
    }
}
