//! MongoDB client and collection wrapper

use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::{
    options::{FindOptions, IndexOptions},
    Client, Collection, Cursor, IndexModel,
};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::db::store::{Filter, Record, RecordStore, Sort};
use crate::types::{FraError, Result};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping. Fails fast when the server is unreachable.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        let client = Client::with_uri_str(with_timeouts(uri))
            .await
            .map_err(|e| FraError::StoreUnavailable(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| FraError::StoreUnavailable(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get the typed collection for `T`, applying its indexes
    pub async fn collection<T>(&self) -> Result<MongoCollection<T>>
    where
        T: Record + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name).await
    }
}

/// Append short server-selection and connect timeouts so an unreachable
/// server fails at startup instead of on the first request
fn with_timeouts(uri: &str) -> String {
    const TIMEOUTS: &str = "serverSelectionTimeoutMS=3000&connectTimeoutMS=3000";

    let has_path = uri
        .split_once("://")
        .map(|(_, rest)| rest.contains('/'))
        .unwrap_or(false);

    if uri.contains('?') {
        format!("{}&{}", uri, TIMEOUTS)
    } else if has_path {
        format!("{}?{}", uri, TIMEOUTS)
    } else {
        format!("{}/?{}", uri, TIMEOUTS)
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Clone)]
pub struct MongoCollection<T>
where
    T: Record,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Record + IntoIndexes,
{
    async fn new(client: &Client, db_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(T::COLLECTION);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner.create_indexes(indices).await.map_err(|e| {
            FraError::StoreUnavailable(format!(
                "Failed to create indexes on {}: {}",
                T::COLLECTION,
                e
            ))
        })?;

        Ok(())
    }
}

impl<T: Record> MongoCollection<T> {
    /// Collect every document. One undecodable document fails the whole read
    /// so listings never disagree with `count`.
    async fn drain(cursor: Cursor<T>) -> Result<Vec<T>> {
        cursor.try_collect().await.map_err(|e| {
            error!(collection = T::COLLECTION, "Error reading document: {}", e);
            FraError::from(e)
        })
    }
}

#[async_trait::async_trait]
impl<T: Record> RecordStore<T> for MongoCollection<T> {
    async fn insert(&self, record: &T) -> Result<()> {
        self.inner.insert_one(record).await?;
        Ok(())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<T>> {
        let cursor = self.inner.find(filter.to_document()?).await?;
        Self::drain(cursor).await
    }

    async fn find_sorted(&self, filter: &Filter, sort: Sort) -> Result<Vec<T>> {
        let mut order = Document::new();
        order.insert(sort.field, if sort.descending { -1 } else { 1 });
        let options = FindOptions::builder().sort(order).build();

        let cursor = self
            .inner
            .find(filter.to_document()?)
            .with_options(options)
            .await?;
        Self::drain(cursor).await
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        Ok(self.inner.find_one(filter.to_document()?).await?)
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        Ok(self.inner.count_documents(filter.to_document()?).await?)
    }

    async fn update_matching(&self, filter: &Filter, fields: Map<String, Value>) -> Result<bool> {
        let set = bson::to_document(&fields)?;
        let result = self
            .inner
            .update_one(filter.to_document()?, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_timeouts() {
        assert_eq!(
            with_timeouts("mongodb://localhost:27017"),
            "mongodb://localhost:27017/?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000"
        );
        assert_eq!(
            with_timeouts("mongodb://localhost:27017/fra_db"),
            "mongodb://localhost:27017/fra_db?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000"
        );
        assert_eq!(
            with_timeouts("mongodb://localhost:27017/?replicaSet=rs0"),
            "mongodb://localhost:27017/?replicaSet=rs0&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000"
        );
    }
}
