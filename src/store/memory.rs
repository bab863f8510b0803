use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::SUB_STATUS_OWNER_MISSING;
use super::{
    CollectionLink, DocumentQuery, DocumentStore, QueryPage, ResourceStatus, StoreError,
    StoreResult,
};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Default)]
struct MemoryDatabase {
    collections: HashMap<String, MemoryCollection>,
}

struct MemoryCollection {
    partition_key_path: String,
    /// partition key -> id -> document
    partitions: HashMap<String, BTreeMap<String, Value>>,
}

/// Document store kept in process memory.
///
/// Mirrors the partitioning rules of the remote store: documents are keyed
/// by (partition key, id), the partition key in the request must match the
/// document body, and queries are served in bounded pages.
pub struct InMemoryDocumentStore {
    databases: RwLock<HashMap<String, MemoryDatabase>>,
    page_size: usize,
    document_operations: AtomicU64,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Store whose queries return at most `page_size` documents per page
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
            document_operations: AtomicU64::new(0),
        }
    }

    /// Number of document-level calls served so far
    pub fn document_operations(&self) -> u64 {
        self.document_operations.load(Ordering::SeqCst)
    }

    /// Total documents stored in a collection, across partitions
    pub async fn document_count(&self, collection: &CollectionLink) -> usize {
        let databases = self.databases.read().await;
        databases
            .get(&collection.database)
            .and_then(|db| db.collections.get(&collection.collection))
            .map(|coll| coll.partitions.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    fn record_operation(&self) {
        self.document_operations.fetch_add(1, Ordering::SeqCst);
    }
}

fn missing_collection(collection: &CollectionLink) -> StoreError {
    StoreError::from_status(
        404,
        Some(SUB_STATUS_OWNER_MISSING),
        Some("NotFound".to_string()),
        format!("Collection {} does not exist", collection.resource_link()),
    )
}

fn missing_document(id: &str, partition_key: &str) -> StoreError {
    StoreError::not_found(format!(
        "Document '{}' not found in partition '{}'",
        id, partition_key
    ))
}

fn document_id(document: &Value) -> StoreResult<String> {
    match document.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => Err(StoreError::bad_request("Document must carry a non-empty string 'id'")),
    }
}

fn check_partition_key(
    coll: &MemoryCollection,
    document: &Value,
    partition_key: &str,
) -> StoreResult<()> {
    let embedded = document
        .pointer(&coll.partition_key_path)
        .and_then(Value::as_str);

    if embedded != Some(partition_key) {
        return Err(StoreError::bad_request(format!(
            "Partition key '{}' does not match the value at {} in the document",
            partition_key, coll.partition_key_path
        )));
    }
    Ok(())
}

fn stamp(mut document: Value) -> Value {
    if let Some(fields) = document.as_object_mut() {
        fields.insert("_etag".to_string(), Value::String(format!("\"{}\"", Uuid::new_v4())));
        fields.insert("_ts".to_string(), Value::from(Utc::now().timestamp()));
    }
    document
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_database(&self, database: &str) -> StoreResult<ResourceStatus> {
        let mut databases = self.databases.write().await;
        if databases.contains_key(database) {
            return Ok(ResourceStatus::Existing);
        }
        databases.insert(database.to_string(), MemoryDatabase::default());
        Ok(ResourceStatus::Created)
    }

    async fn ensure_collection(
        &self,
        database: &str,
        collection: &str,
        partition_key_path: &str,
    ) -> StoreResult<ResourceStatus> {
        let mut databases = self.databases.write().await;
        let db = databases
            .get_mut(database)
            .ok_or_else(|| StoreError::not_found(format!("Database {} does not exist", database)))?;

        if db.collections.contains_key(collection) {
            return Ok(ResourceStatus::Existing);
        }
        db.collections.insert(
            collection.to_string(),
            MemoryCollection {
                partition_key_path: partition_key_path.to_string(),
                partitions: HashMap::new(),
            },
        );
        Ok(ResourceStatus::Created)
    }

    async fn create_document(
        &self,
        collection: &CollectionLink,
        partition_key: &str,
        document: Value,
    ) -> StoreResult<Value> {
        self.record_operation();
        let mut databases = self.databases.write().await;
        let coll = databases
            .get_mut(&collection.database)
            .and_then(|db| db.collections.get_mut(&collection.collection))
            .ok_or_else(|| missing_collection(collection))?;

        let id = document_id(&document)?;
        check_partition_key(coll, &document, partition_key)?;

        let partition = coll.partitions.entry(partition_key.to_string()).or_default();
        if partition.contains_key(&id) {
            return Err(StoreError::conflict(format!(
                "Document '{}' already exists in partition '{}'",
                id, partition_key
            )));
        }

        let stored = stamp(document);
        partition.insert(id, stored.clone());
        Ok(stored)
    }

    async fn read_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<Value> {
        self.record_operation();
        let databases = self.databases.read().await;
        let coll = databases
            .get(&collection.database)
            .and_then(|db| db.collections.get(&collection.collection))
            .ok_or_else(|| missing_collection(collection))?;

        coll.partitions
            .get(partition_key)
            .and_then(|partition| partition.get(id))
            .cloned()
            .ok_or_else(|| missing_document(id, partition_key))
    }

    async fn replace_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
        document: Value,
    ) -> StoreResult<Value> {
        self.record_operation();
        let mut databases = self.databases.write().await;
        let coll = databases
            .get_mut(&collection.database)
            .and_then(|db| db.collections.get_mut(&collection.collection))
            .ok_or_else(|| missing_collection(collection))?;

        if document_id(&document)? != id {
            return Err(StoreError::bad_request(format!(
                "Document id does not match the addressed id '{}'",
                id
            )));
        }
        check_partition_key(coll, &document, partition_key)?;

        let slot = coll
            .partitions
            .get_mut(partition_key)
            .and_then(|partition| partition.get_mut(id))
            .ok_or_else(|| missing_document(id, partition_key))?;

        let stored = stamp(document);
        *slot = stored.clone();
        Ok(stored)
    }

    async fn delete_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<()> {
        self.record_operation();
        let mut databases = self.databases.write().await;
        let coll = databases
            .get_mut(&collection.database)
            .and_then(|db| db.collections.get_mut(&collection.collection))
            .ok_or_else(|| missing_collection(collection))?;

        let partition = coll
            .partitions
            .get_mut(partition_key)
            .ok_or_else(|| missing_document(id, partition_key))?;

        partition
            .remove(id)
            .ok_or_else(|| missing_document(id, partition_key))?;

        if partition.is_empty() {
            coll.partitions.remove(partition_key);
        }
        Ok(())
    }

    async fn query_documents(
        &self,
        collection: &CollectionLink,
        query: &DocumentQuery,
        partition_key: Option<&str>,
        continuation: Option<String>,
    ) -> StoreResult<QueryPage> {
        self.record_operation();
        let offset = match continuation {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::bad_request(format!("Invalid continuation token '{}'", token)))?,
            None => 0,
        };

        let databases = self.databases.read().await;
        let coll = databases
            .get(&collection.database)
            .and_then(|db| db.collections.get(&collection.collection))
            .ok_or_else(|| missing_collection(collection))?;

        let matching: Vec<&Value> = match partition_key {
            Some(key) => coll
                .partitions
                .get(key)
                .into_iter()
                .flat_map(BTreeMap::values)
                .filter(|doc| query.matches(doc))
                .collect(),
            None => {
                let mut keys: Vec<&String> = coll.partitions.keys().collect();
                keys.sort();
                keys.into_iter()
                    .flat_map(|key| coll.partitions[key].values())
                    .filter(|doc| query.matches(doc))
                    .collect()
            }
        };

        let documents: Vec<Value> = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|doc| (*doc).clone())
            .collect();

        let next = offset + documents.len();
        let continuation = (next < matching.len()).then(|| next.to_string());

        Ok(QueryPage {
            documents,
            continuation,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
