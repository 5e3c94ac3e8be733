//! The remote store contract and its implementations.
//!
//! The hosted database is the source of truth. Everything in the core talks
//! to it through [`RemoteStore`]; [`LocalStore`] backs tests and offline use,
//! [`RestStore`] speaks to a PostgREST endpoint.

mod local;
mod rest;

pub use local::{LocalStore, StoreOp, WriteOp};
pub use rest::RestStore;

use crate::config::{Config, StoreConfig};
use crate::error::{LaunchpadError, Result};
use crate::types::{Collection, Filters};
use std::future::Future;
use std::path::Path;

/// One row as returned by the store: a JSON object.
pub type Record = serde_json::Value;

/// Partial update payload: column name to new value.
pub type Fields = serde_json::Map<String, serde_json::Value>;

pub trait RemoteStore: Send + Sync + 'static {
    /// Fetch one record by id. Fails with `NotFound` when absent.
    fn get(&self, collection: Collection, id: &str)
        -> impl Future<Output = Result<Record>> + Send;

    /// Insert a record, assigning an `id` when the payload has none.
    fn insert(&self, collection: Collection, record: Record)
        -> impl Future<Output = Result<Record>> + Send;

    /// Apply a partial update and return the updated record.
    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> impl Future<Output = Result<Record>> + Send;

    /// Set a checklist item's completion flag, stamping `completed_at`.
    fn toggle(&self, item_id: &str, completed: bool)
        -> impl Future<Output = Result<Record>> + Send;

    /// All records whose columns equal every filter value, in insertion order.
    fn list(
        &self,
        collection: Collection,
        filters: &Filters,
    ) -> impl Future<Output = Result<Vec<Record>>> + Send;
}

/// Read the `id` column of a record.
pub fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(|v| v.as_str())
}

// ---------------------------------------------------------------------------
// AnyStore
// ---------------------------------------------------------------------------

/// The store selected by configuration.
pub enum AnyStore {
    Local(LocalStore),
    Rest(RestStore),
}

impl AnyStore {
    pub fn from_config(root: &Path, config: &Config) -> Result<Self> {
        match &config.store {
            StoreConfig::Local { path } => {
                let path = root.join(path);
                Ok(AnyStore::Local(LocalStore::open(&path)?))
            }
            StoreConfig::Rest { url, api_key_env } => {
                let key = std::env::var(api_key_env).ok();
                if key.is_none() {
                    tracing::warn!("{api_key_env} is not set; requests will be anonymous");
                }
                Ok(AnyStore::Rest(RestStore::new(url.clone(), key)))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnyStore::Local(_) => "local",
            AnyStore::Rest(_) => "rest",
        }
    }
}

impl RemoteStore for AnyStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Record> {
        match self {
            AnyStore::Local(s) => s.get(collection, id).await,
            AnyStore::Rest(s) => s.get(collection, id).await,
        }
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<Record> {
        match self {
            AnyStore::Local(s) => s.insert(collection, record).await,
            AnyStore::Rest(s) => s.insert(collection, record).await,
        }
    }

    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<Record> {
        match self {
            AnyStore::Local(s) => s.update(collection, id, fields).await,
            AnyStore::Rest(s) => s.update(collection, id, fields).await,
        }
    }

    async fn toggle(&self, item_id: &str, completed: bool) -> Result<Record> {
        match self {
            AnyStore::Local(s) => s.toggle(item_id, completed).await,
            AnyStore::Rest(s) => s.toggle(item_id, completed).await,
        }
    }

    async fn list(&self, collection: Collection, filters: &Filters) -> Result<Vec<Record>> {
        match self {
            AnyStore::Local(s) => s.list(collection, filters).await,
            AnyStore::Rest(s) => s.list(collection, filters).await,
        }
    }
}

fn not_found(collection: Collection, id: &str) -> LaunchpadError {
    LaunchpadError::not_found(collection.as_str(), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_config_opens_local_store_under_root() {
        let dir = TempDir::new().unwrap();
        let config = Config::new("my-app", "My App");
        let store = AnyStore::from_config(dir.path(), &config).unwrap();
        assert_eq!(store.kind(), "local");
    }

    #[test]
    fn from_config_builds_rest_store() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::new("my-app", "My App");
        config.store = StoreConfig::Rest {
            url: "http://localhost:54321".into(),
            api_key_env: "LAUNCHPAD_TEST_UNSET_KEY".into(),
        };
        let store = AnyStore::from_config(dir.path(), &config).unwrap();
        assert_eq!(store.kind(), "rest");
    }

    #[test]
    fn record_id_reads_string_id() {
        assert_eq!(record_id(&serde_json::json!({ "id": "x1" })), Some("x1"));
        assert_eq!(record_id(&serde_json::json!({ "id": 7 })), None);
    }
}
