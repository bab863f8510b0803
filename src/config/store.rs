use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{AppError, Result};
use crate::modules::employees::models::PARTITION_KEY_PATH;
use crate::store::{CosmosDocumentStore, CosmosOptions, DocumentStore, InMemoryDocumentStore, MasterKey};

/// Which document store implementation to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Cosmos,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosmos" => Ok(StoreBackend::Cosmos),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::configuration(format!(
                "Invalid STORE_BACKEND '{}', expected 'cosmos' or 'memory'",
                other
            ))),
        }
    }
}

/// Parsed `AccountEndpoint=...;AccountKey=...;` connection string
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub account_endpoint: String,
    pub account_key: String,
}

impl FromStr for ConnectionString {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let mut account_endpoint = None;
        let mut account_key = None;

        for part in s.split(';').map(str::trim).filter(|part| !part.is_empty()) {
            // the key is base64 and may itself contain '='
            let (name, value) = part.split_once('=').ok_or_else(|| {
                AppError::configuration(format!("Malformed connection string segment '{}'", part))
            })?;

            match name.trim().to_ascii_lowercase().as_str() {
                "accountendpoint" => account_endpoint = Some(value.trim().to_string()),
                "accountkey" => account_key = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let account_endpoint = account_endpoint
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::configuration("Connection string is missing AccountEndpoint"))?;
        let account_key = account_key
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::configuration("Connection string is missing AccountKey"))?;

        if !account_endpoint.starts_with("http://") && !account_endpoint.starts_with("https://") {
            return Err(AppError::configuration(
                "AccountEndpoint must be an http(s) URL",
            ));
        }

        Ok(Self {
            account_endpoint,
            account_key,
        })
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_endpoint", &self.account_endpoint)
            .field("account_key", &"<redacted>")
            .finish()
    }
}

/// Document store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub connection: Option<ConnectionString>,
    pub database_name: String,
    pub collection_name: String,
    pub partition_key_path: String,
    pub request_timeout: Duration,
    pub max_item_count: Option<u32>,
}

impl StoreConfig {
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend: StoreBackend = var("STORE_BACKEND")
            .unwrap_or_else(|| "cosmos".to_string())
            .parse()?;

        let connection = match (backend, var("COSMOS_CONNECTION_STRING")) {
            (_, Some(raw)) if !raw.trim().is_empty() => Some(raw.parse::<ConnectionString>()?),
            (StoreBackend::Cosmos, _) => {
                return Err(AppError::configuration("COSMOS_CONNECTION_STRING not set"))
            }
            (StoreBackend::Memory, _) => None,
        };

        Ok(StoreConfig {
            backend,
            connection,
            database_name: var("COSMOS_DATABASE_NAME")
                .ok_or_else(|| AppError::configuration("COSMOS_DATABASE_NAME not set"))?,
            collection_name: var("COSMOS_COLLECTION_NAME")
                .ok_or_else(|| AppError::configuration("COSMOS_COLLECTION_NAME not set"))?,
            partition_key_path: var("COSMOS_PARTITION_KEY_PATH")
                .ok_or_else(|| AppError::configuration("COSMOS_PARTITION_KEY_PATH not set"))?,
            request_timeout: Duration::from_secs(
                var("COSMOS_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .map_err(|_| AppError::configuration("Invalid COSMOS_REQUEST_TIMEOUT_SECS"))?,
            ),
            max_item_count: var("COSMOS_MAX_ITEM_COUNT")
                .map(|raw| {
                    raw.parse()
                        .map_err(|_| AppError::configuration("Invalid COSMOS_MAX_ITEM_COUNT"))
                })
                .transpose()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_name.trim().is_empty() {
            return Err(AppError::configuration("Database name must not be empty"));
        }

        if self.collection_name.trim().is_empty() {
            return Err(AppError::configuration("Collection name must not be empty"));
        }

        if !self.partition_key_path.starts_with('/') || self.partition_key_path.trim() == "/" {
            return Err(AppError::configuration(
                "Partition key path must be a document path such as /department/departmentId",
            ));
        }

        // employee documents are only ever written under this path
        if self.partition_key_path != PARTITION_KEY_PATH {
            return Err(AppError::configuration(format!(
                "COSMOS_PARTITION_KEY_PATH must be {} (got {})",
                PARTITION_KEY_PATH, self.partition_key_path
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(AppError::configuration(
                "Store request timeout must be greater than 0",
            ));
        }

        if self.max_item_count == Some(0) {
            return Err(AppError::configuration(
                "COSMOS_MAX_ITEM_COUNT must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Build the configured document store client
    pub fn create_store(&self) -> Result<Arc<dyn DocumentStore>> {
        match self.backend {
            StoreBackend::Memory => {
                let store = match self.max_item_count {
                    Some(page_size) => InMemoryDocumentStore::with_page_size(page_size as usize),
                    None => InMemoryDocumentStore::new(),
                };
                Ok(Arc::new(store))
            }
            StoreBackend::Cosmos => {
                let connection = self.connection.as_ref().ok_or_else(|| {
                    AppError::configuration("COSMOS_CONNECTION_STRING not set")
                })?;
                let key = MasterKey::from_base64(&connection.account_key)?;
                let options = CosmosOptions {
                    request_timeout: self.request_timeout,
                    max_item_count: self.max_item_count,
                };
                let store = CosmosDocumentStore::new(&connection.account_endpoint, key, options)
                    .map_err(|e| AppError::configuration(format!("Failed to build store client: {}", e)))?;
                Ok(Arc::new(store))
            }
        }
    }
}
