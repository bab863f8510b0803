//! Client for the Cosmos DB SQL REST API.
//!
//! Every request is signed with the account master key (see [`auth`]).
//! No retry policy is applied here; a failed call surfaces immediately.

pub mod auth;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

pub use auth::{MasterKey, ResourceType};

use super::{
    CollectionLink, DocumentQuery, DocumentStore, QueryPage, ResourceStatus, StoreError,
    StoreResult,
};

const API_VERSION: &str = "2018-12-31";

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HEADER_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const HEADER_CONTINUATION: &str = "x-ms-continuation";
const HEADER_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
const HEADER_SUB_STATUS: &str = "x-ms-substatus";

/// Tunables for the REST client
#[derive(Debug, Clone)]
pub struct CosmosOptions {
    pub request_timeout: Duration,
    /// Page size hint for queries; the service default applies when unset
    pub max_item_count: Option<u32>,
}

impl Default for CosmosOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_item_count: None,
        }
    }
}

/// Document store backed by a Cosmos DB account
pub struct CosmosDocumentStore {
    client: Client,
    endpoint: String,
    key: MasterKey,
    max_item_count: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

impl CosmosDocumentStore {
    pub fn new(endpoint: &str, key: MasterKey, options: CosmosOptions) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(StoreError::from)?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key,
            max_item_count: options.max_item_count,
        })
    }

    /// Start a signed request.
    ///
    /// `path` is the URL path (ids percent-encoded); `resource_link` is the
    /// unencoded link that gets signed.
    fn request(
        &self,
        method: Method,
        path: &str,
        resource_type: ResourceType,
        resource_link: &str,
    ) -> RequestBuilder {
        let date = auth::http_date(Utc::now());
        let authorization = self
            .key
            .authorization(method.as_str(), resource_type, resource_link, &date);

        self.client
            .request(method, format!("{}/{}", self.endpoint, path))
            .header("authorization", authorization)
            .header(HEADER_DATE, date)
            .header(HEADER_VERSION, API_VERSION)
            .header("accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(StoreError::from)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    fn document_path(collection: &CollectionLink, id: &str) -> (String, String) {
        let link = format!("{}/docs/{}", collection.resource_link(), id);
        let path = format!(
            "dbs/{}/colls/{}/docs/{}",
            urlencoding::encode(&collection.database),
            urlencoding::encode(&collection.collection),
            urlencoding::encode(id)
        );
        (path, link)
    }

    fn docs_path(collection: &CollectionLink) -> String {
        format!(
            "dbs/{}/colls/{}/docs",
            urlencoding::encode(&collection.database),
            urlencoding::encode(&collection.collection)
        )
    }
}

fn partition_key_header(partition_key: &str) -> String {
    json!([partition_key]).to_string()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn error_from_response(response: Response) -> StoreError {
    let status = response.status();
    let sub_status = header_str(response.headers(), HEADER_SUB_STATUS)
        .and_then(|value| value.parse::<u32>().ok());
    let body = response.text().await.unwrap_or_default();

    let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => (parsed.code, parsed.message.unwrap_or(body)),
        Err(_) => (None, body),
    };

    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown store error")
            .to_string()
    } else {
        message
    };

    StoreError::from_status(status.as_u16(), sub_status, code, message)
}

async fn json_body(response: Response) -> StoreResult<Value> {
    response.json::<Value>().await.map_err(StoreError::from)
}

#[async_trait]
impl DocumentStore for CosmosDocumentStore {
    fn name(&self) -> &'static str {
        "cosmos"
    }

    async fn ensure_database(&self, database: &str) -> StoreResult<ResourceStatus> {
        let link = format!("dbs/{}", database);
        let path = format!("dbs/{}", urlencoding::encode(database));
        let lookup = self.request(Method::GET, &path, ResourceType::Database, &link);

        match self.send(lookup).await {
            Ok(_) => return Ok(ResourceStatus::Existing),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let create = self
            .request(Method::POST, "dbs", ResourceType::Database, "")
            .json(&json!({ "id": database }));

        match self.send(create).await {
            Ok(_) => Ok(ResourceStatus::Created),
            // created concurrently by another instance
            Err(err) if err.is_conflict() => Ok(ResourceStatus::Existing),
            Err(err) => Err(err),
        }
    }

    async fn ensure_collection(
        &self,
        database: &str,
        collection: &str,
        partition_key_path: &str,
    ) -> StoreResult<ResourceStatus> {
        let coll = CollectionLink::new(database, collection);
        let path = format!(
            "dbs/{}/colls/{}",
            urlencoding::encode(database),
            urlencoding::encode(collection)
        );
        let lookup = self.request(
            Method::GET,
            &path,
            ResourceType::Collection,
            &coll.resource_link(),
        );

        match self.send(lookup).await {
            Ok(_) => return Ok(ResourceStatus::Existing),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let create = self
            .request(
                Method::POST,
                &format!("dbs/{}/colls", urlencoding::encode(database)),
                ResourceType::Collection,
                &format!("dbs/{}", database),
            )
            .json(&json!({
                "id": collection,
                "partitionKey": {
                    "paths": [partition_key_path],
                    "kind": "Hash"
                }
            }));

        match self.send(create).await {
            Ok(_) => Ok(ResourceStatus::Created),
            Err(err) if err.is_conflict() => Ok(ResourceStatus::Existing),
            Err(err) => Err(err),
        }
    }

    async fn create_document(
        &self,
        collection: &CollectionLink,
        partition_key: &str,
        document: Value,
    ) -> StoreResult<Value> {
        let request = self
            .request(
                Method::POST,
                &Self::docs_path(collection),
                ResourceType::Document,
                &collection.resource_link(),
            )
            .header(HEADER_PARTITION_KEY, partition_key_header(partition_key))
            .json(&document);

        json_body(self.send(request).await?).await
    }

    async fn read_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<Value> {
        let (path, link) = Self::document_path(collection, id);
        let request = self
            .request(Method::GET, &path, ResourceType::Document, &link)
            .header(HEADER_PARTITION_KEY, partition_key_header(partition_key));

        json_body(self.send(request).await?).await
    }

    async fn replace_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
        document: Value,
    ) -> StoreResult<Value> {
        let (path, link) = Self::document_path(collection, id);
        let request = self
            .request(Method::PUT, &path, ResourceType::Document, &link)
            .header(HEADER_PARTITION_KEY, partition_key_header(partition_key))
            .json(&document);

        json_body(self.send(request).await?).await
    }

    async fn delete_document(
        &self,
        collection: &CollectionLink,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<()> {
        let (path, link) = Self::document_path(collection, id);
        let request = self
            .request(Method::DELETE, &path, ResourceType::Document, &link)
            .header(HEADER_PARTITION_KEY, partition_key_header(partition_key));

        self.send(request).await?;
        Ok(())
    }

    async fn query_documents(
        &self,
        collection: &CollectionLink,
        query: &DocumentQuery,
        partition_key: Option<&str>,
        continuation: Option<String>,
    ) -> StoreResult<QueryPage> {
        let (sql, parameters) = query.to_sql();
        let body = serde_json::to_vec(&json!({
            "query": sql,
            "parameters": parameters,
        }))?;

        let mut request = self
            .request(
                Method::POST,
                &Self::docs_path(collection),
                ResourceType::Document,
                &collection.resource_link(),
            )
            .header("content-type", "application/query+json")
            .header(HEADER_IS_QUERY, "True")
            .body(body);

        request = match partition_key {
            Some(key) => request.header(HEADER_PARTITION_KEY, partition_key_header(key)),
            None => request.header(HEADER_CROSS_PARTITION, "True"),
        };
        if let Some(token) = continuation {
            request = request.header(HEADER_CONTINUATION, token);
        }
        if let Some(max) = self.max_item_count {
            request = request.header(HEADER_MAX_ITEM_COUNT, max.to_string());
        }

        let response = self.send(request).await?;
        let continuation = header_str(response.headers(), HEADER_CONTINUATION)
            .filter(|token| !token.is_empty());
        let page: QueryResponse = response.json().await.map_err(StoreError::from)?;

        Ok(QueryPage {
            documents: page.documents,
            continuation,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        let request = self.request(Method::GET, "", ResourceType::Account, "");
        self.send(request).await?;
        Ok(())
    }
}
