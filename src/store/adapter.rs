use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;

use super::{
    CollectionLink, DocumentQuery, DocumentStore, QueryPage, ResourceStatus, StoreResult,
};
use crate::core::{AppError, Result};

/// Collection bound at startup. Read-only after initialization and safe to
/// share between concurrent requests.
pub struct CollectionHandle {
    store: Arc<dyn DocumentStore>,
    link: CollectionLink,
    partition_key_path: String,
}

impl CollectionHandle {
    pub fn link(&self) -> &CollectionLink {
        &self.link
    }

    pub fn partition_key_path(&self) -> &str {
        &self.partition_key_path
    }

    pub async fn create(&self, partition_key: &str, document: Value) -> StoreResult<Value> {
        self.store
            .create_document(&self.link, partition_key, document)
            .await
    }

    pub async fn read(&self, id: &str, partition_key: &str) -> StoreResult<Value> {
        self.store.read_document(&self.link, id, partition_key).await
    }

    pub async fn replace(&self, id: &str, partition_key: &str, document: Value) -> StoreResult<Value> {
        self.store
            .replace_document(&self.link, id, partition_key, document)
            .await
    }

    pub async fn delete(&self, id: &str, partition_key: &str) -> StoreResult<()> {
        self.store.delete_document(&self.link, id, partition_key).await
    }

    pub async fn query_page(
        &self,
        query: &DocumentQuery,
        partition_key: Option<&str>,
        continuation: Option<String>,
    ) -> StoreResult<QueryPage> {
        self.store
            .query_documents(&self.link, query, partition_key, continuation)
            .await
    }
}

/// Owns the store client and the single collection it is bound to
pub struct DocumentStoreAdapter {
    store: Arc<dyn DocumentStore>,
    collection: OnceCell<Arc<CollectionHandle>>,
}

impl DocumentStoreAdapter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: OnceCell::new(),
        }
    }

    /// Ensure the database and collection exist, then bind the collection.
    ///
    /// Concurrent callers share one initialization. Calling again with the
    /// same names returns the bound handle; different names are rejected.
    pub async fn initialize(
        &self,
        database_name: &str,
        collection_name: &str,
        partition_key_path: &str,
    ) -> Result<Arc<CollectionHandle>> {
        require_setting("database name", database_name)?;
        require_setting("collection name", collection_name)?;
        require_setting("partition key path", partition_key_path)?;

        let handle = self
            .collection
            .get_or_try_init(|| self.bind(database_name, collection_name, partition_key_path))
            .await?;

        if handle.link.database != database_name
            || handle.link.collection != collection_name
            || handle.partition_key_path != partition_key_path
        {
            return Err(AppError::configuration(format!(
                "Document store already initialized for {} (partition key {})",
                handle.link.resource_link(),
                handle.partition_key_path
            )));
        }

        Ok(handle.clone())
    }

    async fn bind(
        &self,
        database_name: &str,
        collection_name: &str,
        partition_key_path: &str,
    ) -> Result<Arc<CollectionHandle>> {
        let backend = self.store.name();

        let database_status = self.store.ensure_database(database_name).await?;
        match database_status {
            ResourceStatus::Created => {
                tracing::info!(backend, database = database_name, "Created database")
            }
            ResourceStatus::Existing => {
                tracing::info!(backend, database = database_name, "Verified database exists")
            }
        }

        let collection_status = self
            .store
            .ensure_collection(database_name, collection_name, partition_key_path)
            .await?;
        match collection_status {
            ResourceStatus::Created => tracing::info!(
                backend,
                database = database_name,
                collection = collection_name,
                partition_key_path,
                "Created collection"
            ),
            ResourceStatus::Existing => tracing::info!(
                backend,
                database = database_name,
                collection = collection_name,
                partition_key_path,
                "Verified collection exists"
            ),
        }

        Ok(Arc::new(CollectionHandle {
            store: self.store.clone(),
            link: CollectionLink::new(database_name, collection_name),
            partition_key_path: partition_key_path.to_string(),
        }))
    }

    /// The bound collection, or an error if `initialize` has not completed
    pub fn collection(&self) -> Result<Arc<CollectionHandle>> {
        self.collection
            .get()
            .cloned()
            .ok_or_else(|| AppError::internal("Document store used before initialization"))
    }

    pub fn is_initialized(&self) -> bool {
        self.collection.initialized()
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.store.ping().await
    }
}

fn require_setting(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::configuration(format!(
            "Document store {} must not be empty",
            name
        )));
    }
    Ok(())
}
