//! In-memory record store
//!
//! Keeps each collection as a list of JSON documents behind a
//! `tokio::sync::RwLock`. Used when MongoDB is unreachable in dev mode and by
//! the test suites. Nothing is persisted.

use serde_json::{Map, Value};
use std::marker::PhantomData;
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::store::{to_json, Filter, Record, RecordStore, Sort};
use crate::types::{FraError, Result};

/// Process-local collection of `T`
pub struct MemoryStore<T> {
    documents: RwLock<Vec<Value>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            _record: PhantomData,
        }
    }

    fn decode(document: &Value) -> Result<T> {
        serde_json::from_value(document.clone()).map_err(|e| {
            FraError::Internal(format!("Corrupt {} document: {}", T::COLLECTION, e))
        })
    }

    /// First unique field of `candidate` already taken by another document
    fn clash(documents: &[Value], candidate: &Value, skip: Option<usize>) -> Option<&'static str> {
        T::UNIQUE_FIELDS.iter().copied().find(|field| {
            let Some(value) = candidate.get(*field) else {
                return false;
            };
            documents
                .iter()
                .enumerate()
                .filter(|(idx, _)| Some(*idx) != skip)
                .any(|(_, existing)| existing.get(*field) == Some(value))
        })
    }
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn insert(&self, record: &T) -> Result<()> {
        let document = to_json(record)?;
        let mut documents = self.documents.write().await;

        if let Some(field) = Self::clash(&documents, &document, None) {
            return Err(FraError::Conflict(format!(
                "Duplicate {} in {}",
                field,
                T::COLLECTION
            )));
        }

        documents.push(document);
        debug!(collection = T::COLLECTION, id = record.record_id(), "Inserted record");
        Ok(())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<T>> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .filter(|document| filter.matches(document))
            .map(Self::decode)
            .collect()
    }

    async fn find_sorted(&self, filter: &Filter, sort: Sort) -> Result<Vec<T>> {
        let documents = self.documents.read().await;
        let mut matching: Vec<&Value> = documents
            .iter()
            .filter(|document| filter.matches(document))
            .collect();
        // Stable, so ties keep insertion order
        matching.sort_by(|a, b| sort.compare(a, b));
        matching.into_iter().map(Self::decode).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|document| filter.matches(document)).count() as u64)
    }

    async fn update_matching(&self, filter: &Filter, fields: Map<String, Value>) -> Result<bool> {
        let mut documents = self.documents.write().await;

        let Some(idx) = documents.iter().position(|document| filter.matches(document)) else {
            return Ok(false);
        };

        let mut updated = documents[idx].clone();
        if let Value::Object(map) = &mut updated {
            map.extend(fields);
        }

        // Reject updates that would not read back as a valid record
        Self::decode(&updated)?;

        if let Some(field) = Self::clash(&documents, &updated, Some(idx)) {
            return Err(FraError::Conflict(format!(
                "Duplicate {} in {}",
                field,
                T::COLLECTION
            )));
        }

        documents[idx] = updated;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Plot {
        id: String,
        code: String,
        rank: u32,
    }

    impl Record for Plot {
        const COLLECTION: &'static str = "plots";
        const UNIQUE_FIELDS: &'static [&'static str] = &["id", "code"];

        fn record_id(&self) -> &str {
            &self.id
        }
    }

    fn plot(id: &str, code: &str, rank: u32) -> Plot {
        Plot {
            id: id.into(),
            code: code.into(),
            rank,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::<Plot>::new();
        store.insert(&plot("a", "P-1", 2)).await.unwrap();
        store.insert(&plot("b", "P-2", 1)).await.unwrap();

        assert_eq!(store.count(&Filter::new()).await.unwrap(), 2);

        let found = store.find_one(&Filter::new().eq("code", "P-2")).await.unwrap();
        assert_eq!(found, Some(plot("b", "P-2", 1)));

        let sorted = store.find_sorted(&Filter::new(), Sort::asc("rank")).await.unwrap();
        assert_eq!(sorted[0].id, "b");
    }

    #[tokio::test]
    async fn test_unique_fields_enforced() {
        let store = MemoryStore::<Plot>::new();
        store.insert(&plot("a", "P-1", 1)).await.unwrap();

        let err = store.insert(&plot("b", "P-1", 1)).await.unwrap_err();
        assert!(matches!(err, FraError::Conflict(_)));
        assert_eq!(store.count(&Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_fields() {
        let store = MemoryStore::<Plot>::new();
        store.insert(&plot("a", "P-1", 1)).await.unwrap();
        store.insert(&plot("b", "P-2", 1)).await.unwrap();

        let mut fields = Map::new();
        fields.insert("rank".into(), json!(7));
        assert!(store.update_fields("a", fields).await.unwrap());

        let updated = store.find_one(&Filter::new().eq("id", "a")).await.unwrap().unwrap();
        assert_eq!(updated.rank, 7);

        assert!(!store.update_fields("missing", Map::new()).await.unwrap());

        let mut bad = Map::new();
        bad.insert("rank".into(), json!("seven"));
        assert!(store.update_fields("a", bad).await.is_err());

        let mut guarded = Map::new();
        guarded.insert("rank".into(), json!(9));
        let stale = Filter::new().eq("id", "a").eq("rank", 1);
        assert!(!store.update_matching(&stale, guarded.clone()).await.unwrap());
        let current = Filter::new().eq("id", "a").eq("rank", 7);
        assert!(store.update_matching(&current, guarded).await.unwrap());

        let mut clash = Map::new();
        clash.insert("code".into(), json!("P-2"));
        assert!(matches!(
            store.update_fields("a", clash).await,
            Err(FraError::Conflict(_))
        ));
    }
}
