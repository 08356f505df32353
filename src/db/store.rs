//! Record store abstraction
//!
//! Services talk to collections through [`RecordStore`], so the same code
//! runs against MongoDB in production and the in-memory store in dev mode
//! and tests. Filters are plain conjunctions of exact-match clauses; both
//! backends evaluate them over the serialized JSON shape of a record.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::db::memory::MemoryStore;
use crate::db::mongo::MongoClient;
use crate::db::schemas::{ClaimDoc, UserDoc, VillageDoc};
use crate::types::{FraError, Result};

/// A document type that lives in its own collection
pub trait Record: Serialize + DeserializeOwned + Clone + Unpin + Send + Sync + 'static {
    const COLLECTION: &'static str;

    /// Fields that must not repeat across the collection
    const UNIQUE_FIELDS: &'static [&'static str];

    fn record_id(&self) -> &str;
}

/// One `field = value` or `field ∈ set` condition
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq(String, Value),
    OneOf(String, Vec<Value>),
}

/// Conjunction of clauses. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.to_string(), value.into()));
        self
    }

    /// Add an equality clause only when `value` is present
    pub fn eq_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    /// Field must equal one of `values`. An empty set matches nothing.
    pub fn one_of<V, I>(mut self, field: &str, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push(Clause::OneOf(field.to_string(), values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate against a record's JSON form
    pub fn matches(&self, record: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, expected) => record.get(field) == Some(expected),
            Clause::OneOf(field, allowed) => record
                .get(field)
                .map(|actual| allowed.contains(actual))
                .unwrap_or(false),
        })
    }

    /// Equivalent MongoDB query document
    pub fn to_document(&self) -> Result<bson::Document> {
        let mut document = bson::Document::new();
        for clause in &self.clauses {
            match clause {
                Clause::Eq(field, value) => {
                    document.insert(field.clone(), bson::to_bson(value)?);
                }
                Clause::OneOf(field, values) => {
                    let set = bson::to_bson(values)?;
                    document.insert(field.clone(), bson::doc! { "$in": set });
                }
            }
        }
        Ok(document)
    }
}

/// Sort on a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub descending: bool,
}

impl Sort {
    pub fn asc(field: &'static str) -> Self {
        Self { field, descending: false }
    }

    pub fn desc(field: &'static str) -> Self {
        Self { field, descending: true }
    }

    /// Ordering of two JSON records under this sort
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = compare_values(a.get(self.field), b.get(self.field));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Missing and null sort first, then numbers, strings, booleans
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Typed access to one collection
///
/// Any backend failure is reported as `StoreUnavailable`; unique-key
/// clashes as `Conflict`. Callers generate identifiers.
#[async_trait::async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    async fn insert(&self, record: &T) -> Result<()>;

    async fn find(&self, filter: &Filter) -> Result<Vec<T>>;

    async fn find_sorted(&self, filter: &Filter, sort: Sort) -> Result<Vec<T>>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    async fn count(&self, filter: &Filter) -> Result<u64>;

    /// Overwrite the given top-level fields of the first record matching
    /// `filter`. Returns false when nothing matched.
    async fn update_matching(&self, filter: &Filter, fields: Map<String, Value>) -> Result<bool>;

    /// Overwrite the given top-level fields of the record with `id`.
    /// Returns false when no such record exists.
    async fn update_fields(&self, id: &str, fields: Map<String, Value>) -> Result<bool> {
        self.update_matching(&Filter::new().eq("id", id), fields).await
    }
}

/// Which backend is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Mongo => "mongodb",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Handles for every collection the service uses
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn RecordStore<UserDoc>>,
    pub villages: Arc<dyn RecordStore<VillageDoc>>,
    pub claims: Arc<dyn RecordStore<ClaimDoc>>,
    backend: StoreBackend,
}

impl Stores {
    /// Open the collections on a connected client, applying indexes
    pub async fn mongo(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            users: Arc::new(client.collection::<UserDoc>().await?),
            villages: Arc::new(client.collection::<VillageDoc>().await?),
            claims: Arc::new(client.collection::<ClaimDoc>().await?),
            backend: StoreBackend::Mongo,
        })
    }

    /// Empty process-local collections
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryStore::<UserDoc>::new()),
            villages: Arc::new(MemoryStore::<VillageDoc>::new()),
            claims: Arc::new(MemoryStore::<ClaimDoc>::new()),
            backend: StoreBackend::Memory,
        }
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }
}

/// Serialize a record for filtering, sorting and merging
pub(crate) fn to_json<T: Serialize>(record: &T) -> Result<Value> {
    serde_json::to_value(record)
        .map_err(|e| FraError::Internal(format!("Failed to encode record: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches() {
        let record = json!({"state": "Jharkhand", "district": "Ranchi", "population": 2450});

        assert!(Filter::new().matches(&record));
        assert!(Filter::new().eq("district", "Ranchi").matches(&record));
        assert!(!Filter::new()
            .eq("district", "Ranchi")
            .eq("state", "Odisha")
            .matches(&record));
        assert!(Filter::new().one_of("district", ["Khunti", "Ranchi"]).matches(&record));
        assert!(!Filter::new().one_of("district", Vec::<String>::new()).matches(&record));
        assert!(!Filter::new().eq("tehsil", "Namkum").matches(&record));
    }

    #[test]
    fn test_eq_opt_skips_none() {
        let filter = Filter::new().eq_opt("status", None::<String>);
        assert!(filter.is_empty());

        let filter = Filter::new().eq_opt("status", Some("pending"));
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_to_document() {
        let document = Filter::new()
            .eq("status", "pending")
            .one_of("village_id", ["v1", "v2"])
            .to_document()
            .unwrap();

        assert_eq!(
            document,
            bson::doc! { "status": "pending", "village_id": { "$in": ["v1", "v2"] } }
        );
    }

    #[test]
    fn test_sort_compare() {
        let older = json!({"submitted_date": "2025-01-01T00:00:00.000000Z"});
        let newer = json!({"submitted_date": "2025-02-01T00:00:00.000000Z"});

        assert_eq!(Sort::asc("submitted_date").compare(&older, &newer), Ordering::Less);
        assert_eq!(Sort::desc("submitted_date").compare(&older, &newer), Ordering::Greater);
        assert_eq!(
            Sort::asc("population").compare(&json!({"population": 9}), &json!({"population": 10})),
            Ordering::Less
        );
    }
}
