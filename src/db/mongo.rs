//! MongoDB client and collection wrapper

use bson::{doc, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::db::schemas::Metadata;
use crate::store::StoreError;
use crate::types::CoffeeShopError;

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// True when `err` is a unique index violation
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            StoreError::Conflict(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, CoffeeShopError> {
        info!(db = db_name, "Connecting to MongoDB");

        // Fail fast when the server is unreachable
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| CoffeeShopError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| CoffeeShopError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection with its indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, CoffeeShopError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, CoffeeShopError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;
        debug!(collection = collection_name, "Collection ready");

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), CoffeeShopError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| CoffeeShopError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping its metadata
    pub async fn insert_one(&self, mut item: T) -> Result<(), StoreError> {
        let metadata = item.mut_metadata();
        let now = DateTime::now();
        metadata.created_at = Some(now);
        metadata.updated_at = Some(now);

        self.inner.insert_one(item).await?;
        Ok(())
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, StoreError> {
        Ok(self.inner.find_one(filter).await?)
    }

    pub async fn find_many(&self, filter: Document, sort: Document) -> Result<Vec<T>, StoreError> {
        let cursor = self.inner.find(filter).sort(sort).await?;
        Ok(cursor.try_collect().await?)
    }

    /// `$set` fields on one document, returning the matched count
    pub async fn set_fields(&self, filter: Document, mut fields: Document) -> Result<u64, StoreError> {
        fields.insert("metadata.updated_at", DateTime::now());
        let update: UpdateModifications = doc! { "$set": fields }.into();

        let result = self.inner.update_one(filter, update).await?;
        Ok(result.matched_count)
    }

    /// Delete one document, returning the deleted count
    pub async fn delete_one(&self, filter: Document) -> Result<u64, StoreError> {
        let result = self.inner.delete_one(filter).await?;
        Ok(result.deleted_count)
    }

    pub async fn delete_many(&self, filter: Document) -> Result<u64, StoreError> {
        let result = self.inner.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    /// Atomically apply `update` to the matching document, creating it if
    /// absent, and return the result
    pub async fn upsert_and_get(&self, filter: Document, update: Document) -> Result<Option<T>, StoreError> {
        Ok(self
            .inner
            .find_one_and_update(filter, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?)
    }
}
