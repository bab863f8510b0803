//! Partitioned document store access.
//!
//! [`DocumentStore`] is the seam to a concrete store (the Cosmos REST API or
//! the in-memory store). [`DocumentStoreAdapter`] verifies the database and
//! collection at startup and hands out the bound [`CollectionHandle`] every
//! repository works through.

pub mod adapter;
pub mod cosmos;
pub mod error;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use adapter::{CollectionHandle, DocumentStoreAdapter};
pub use cosmos::{CosmosDocumentStore, CosmosOptions, MasterKey};
pub use error::{StoreError, StoreErrorKind, StoreResult, SUB_STATUS_OWNER_MISSING};
pub use memory::InMemoryDocumentStore;

/// Address of a collection inside a database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionLink {
    pub database: String,
    pub collection: String,
}

impl CollectionLink {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Resource link in the form `dbs/{database}/colls/{collection}`
    pub fn resource_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.collection)
    }
}

/// Outcome of an idempotent "ensure exists" call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Created,
    Existing,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Created => write!(f, "created"),
            ResourceStatus::Existing => write!(f, "existing"),
        }
    }
}

/// Equality filter on a single document path, e.g.
/// `/department/departmentId = "ENG"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuery {
    /// JSON pointer style path, segments separated by `/`
    pub path: String,
    pub value: Value,
}

/// Named parameter of a SQL query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

impl DocumentQuery {
    pub fn field_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Whether a document satisfies the filter
    pub fn matches(&self, document: &Value) -> bool {
        document.pointer(&self.path) == Some(&self.value)
    }

    /// Render as a parameterized SQL query over alias `c`
    pub fn to_sql(&self) -> (String, Vec<QueryParameter>) {
        let accessor: String = self
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| format!("[\"{}\"]", segment.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();

        let sql = format!("SELECT * FROM c WHERE c{} = @value", accessor);
        let parameters = vec![QueryParameter {
            name: "@value".to_string(),
            value: self.value.clone(),
        }];

        (sql, parameters)
    }
}

/// One page of query results
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub documents: Vec<Value>,
    /// Token for the next page; `None` once the result set is drained
    pub continuation: Option<String>,
}

/// Operations a partitioned document store must provide.
///
/// Point operations always carry the partition key; a document is only
/// reachable through the partition it was written to.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name, used in logs
    fn name(&self) -> &'static str;

    /// Create the database unless it already exists
    async fn ensure_database(&self, database: &str) -> StoreResult<ResourceStatus>;

    /// Create the collection with the given partition-key path unless it already exists
    async fn ensure_collection(
        &self,
        database: &str,
        collection: &str,
        partition_key_path: &str,
    ) -> StoreResult<ResourceStatus>;

    /// Insert a new document; fails with a conflict if the id is taken in the partition
    async fn create_document(
        &self,
        collection: &CollectionLink,
        partition_key: &str,
        document: Value,
    ) -> StoreResult<Value>;

    async fn read_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<Value>;

    /// Replace an existing document; never inserts
    async fn replace_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
        document: Value,
    ) -> StoreResult<Value>;

    async fn delete_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<()>;

    /// Fetch one page of documents matching `query`. A `None` partition key
    /// fans out across partitions.
    async fn query_documents(
        &self,
        collection: &CollectionLink,
        query: &DocumentQuery,
        partition_key: Option<&str>,
        continuation: Option<String>,
    ) -> StoreResult<QueryPage>;

    /// Cheap reachability check
    async fn ping(&self) -> StoreResult<()>;
}
