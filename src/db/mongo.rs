//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{
    options::{ClientOptions, IndexOptions, ReturnDocument, UpdateModifications},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::CropchainError;

/// Selection and connect timeout, so an unreachable server fails fast
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db: String,
}

impl MongoClient {
    /// Connect with short selection and connect timeouts, then ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, CropchainError> {
        info!(uri = %uri, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| CropchainError::Config(format!("Invalid MONGODB_URI: {e}")))?;
        options.app_name = Some("cropchain".into());
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);
        options.connect_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::with_options(options)
            .map_err(|e| CropchainError::Database(format!("Failed to connect to MongoDB: {e}")))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| CropchainError::Database(format!("MongoDB ping failed: {e}")))?;

        info!(db = %db_name, "MongoDB ready");

        Ok(Self {
            client,
            db: db_name.to_owned(),
        })
    }

    /// Get a typed collection, applying its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, CropchainError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db, name).await
    }

    pub fn db_name(&self) -> &str {
        &self.db
    }
}

/// Typed MongoDB collection with automatic indexing.
///
/// Every read filters out soft-deleted documents.
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, CropchainError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), CropchainError> {
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
            .map_err(|e| CropchainError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, CropchainError> {
        let now = DateTime::now();
        let metadata = item.mut_metadata();
        metadata.created_at = Some(now);
        metadata.updated_at = Some(now);

        let result = self.inner.insert_one(item).await.map_err(|e| {
            if is_duplicate_key(&e) {
                CropchainError::Conflict("Document already exists".into())
            } else {
                CropchainError::Database(format!("Insert failed: {}", e))
            }
        })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| CropchainError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, CropchainError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| CropchainError::Database(format!("Find failed: {}", e)))
    }

    /// Find a sorted, sliced page of documents
    pub async fn find_page(
        &self,
        filter: Document,
        sort: Document,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, CropchainError> {
        let cursor = self
            .inner
            .find(filter)
            .sort(sort)
            .skip(skip)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(|e| CropchainError::Database(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| CropchainError::Database(format!("Cursor read failed: {}", e)))
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64, CropchainError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| CropchainError::Database(format!("Count failed: {}", e)))
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<u64, CropchainError> {
        let result = self
            .inner
            .update_one(filter, update)
            .await
            .map_err(|e| CropchainError::Database(format!("Update failed: {}", e)))?;

        Ok(result.matched_count)
    }

    /// Apply an update atomically and return the post-update document
    pub async fn update_and_fetch(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<Option<T>, CropchainError> {
        self.inner
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| CropchainError::Database(format!("Update failed: {}", e)))
    }

    /// Run an aggregation pipeline over the documents matching `filter`
    pub async fn aggregate(
        &self,
        filter: Document,
        mut stages: Vec<Document>,
    ) -> Result<Vec<Document>, CropchainError> {
        stages.insert(0, doc! { "$match": filter });

        let cursor = self
            .inner
            .aggregate(stages)
            .await
            .map_err(|e| CropchainError::Database(format!("Aggregate failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| CropchainError::Database(format!("Cursor read failed: {}", e)))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}
