use super::{not_found, record_id, Fields, Record, RemoteStore};
use crate::error::{LaunchpadError, Result};
use crate::types::{Collection, Filters};
use crate::lock;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Operations a [`LocalStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Insert,
    Update,
    Toggle,
    List,
}

/// A mutation applied to a [`LocalStore`], in application order.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert {
        collection: Collection,
        id: String,
    },
    Update {
        collection: Collection,
        id: String,
        fields: Fields,
    },
    Toggle {
        item_id: String,
        completed: bool,
    },
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    collections: BTreeMap<Collection, Vec<Record>>,
}

/// In-process store with optional JSON file persistence.
///
/// Every mutation is appended to a write log so callers can assert exactly
/// which writes reached the store.
#[derive(Debug, Default)]
pub struct LocalStore {
    tables: Mutex<Tables>,
    path: Option<PathBuf>,
    writes: Mutex<Vec<WriteOp>>,
    list_calls: AtomicUsize,
    fail_next: Mutex<HashSet<StoreOp>>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or lazily create) a store persisted at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let tables = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            Tables::default()
        };
        Ok(Self {
            tables: Mutex::new(tables),
            path: Some(path.to_path_buf()),
            ..Default::default()
        })
    }

    /// Make the next call of `op` fail with a `Persistence` error.
    pub fn fail_next(&self, op: StoreOp) {
        lock(&self.fail_next).insert(op);
    }

    pub fn writes(&self) -> Vec<WriteOp> {
        lock(&self.writes).clone()
    }

    pub fn toggle_writes(&self) -> usize {
        lock(&self.writes)
            .iter()
            .filter(|w| matches!(w, WriteOp::Toggle { .. }))
            .count()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self, op: StoreOp) -> Result<()> {
        if lock(&self.fail_next).remove(&op) {
            return Err(LaunchpadError::Persistence(format!(
                "injected {op:?} failure"
            )));
        }
        Ok(())
    }

    /// Apply `change` to a copy of the tables and publish the copy only once
    /// it is on disk. A failed change or write leaves the store untouched.
    fn commit<T>(&self, change: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = lock(&self.tables);
        let mut next = tables.clone();
        let out = change(&mut next)?;
        self.persist(&next)?;
        *tables = next;
        Ok(out)
    }

    fn persist(&self, tables: &Tables) -> Result<()> {
        if let Some(path) = &self.path {
            let data = serde_json::to_string_pretty(tables)?;
            crate::io::atomic_write(path, data.as_bytes()).map_err(|e| {
                LaunchpadError::Persistence(format!("writing {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    fn log(&self, op: WriteOp) {
        lock(&self.writes).push(op);
    }
}

fn find_mut<'a>(rows: &'a mut [Record], id: &str) -> Option<&'a mut Record> {
    rows.iter_mut().find(|r| record_id(r) == Some(id))
}

impl RemoteStore for LocalStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Record> {
        self.check_failure(StoreOp::Get)?;
        let tables = lock(&self.tables);
        tables
            .collections
            .get(&collection)
            .and_then(|rows| rows.iter().find(|r| record_id(r) == Some(id)))
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    async fn insert(&self, collection: Collection, mut record: Record) -> Result<Record> {
        self.check_failure(StoreOp::Insert)?;
        let obj = record
            .as_object_mut()
            .ok_or_else(|| LaunchpadError::MalformedRecord {
                collection: collection.to_string(),
                reason: "record must be a JSON object".into(),
            })?;
        if !obj.contains_key("id") {
            obj.insert(
                "id".into(),
                serde_json::Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        let id = record_id(&record).unwrap_or_default().to_string();

        self.commit(|tables| {
            tables
                .collections
                .entry(collection)
                .or_default()
                .push(record.clone());
            Ok(())
        })?;

        self.log(WriteOp::Insert { collection, id });
        Ok(record)
    }

    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<Record> {
        self.check_failure(StoreOp::Update)?;
        let updated = self.commit(|tables| {
            let rows = tables.collections.entry(collection).or_default();
            let row = find_mut(rows, id).ok_or_else(|| not_found(collection, id))?;
            if let Some(obj) = row.as_object_mut() {
                for (k, v) in &fields {
                    if k != "id" {
                        obj.insert(k.clone(), v.clone());
                    }
                }
            }
            Ok(row.clone())
        })?;

        tracing::debug!(%collection, id, "local update");
        self.log(WriteOp::Update {
            collection,
            id: id.to_string(),
            fields,
        });
        Ok(updated)
    }

    async fn toggle(&self, item_id: &str, completed: bool) -> Result<Record> {
        self.check_failure(StoreOp::Toggle)?;
        let collection = Collection::ChecklistItems;
        let updated = self.commit(|tables| {
            let rows = tables.collections.entry(collection).or_default();
            let row = find_mut(rows, item_id).ok_or_else(|| not_found(collection, item_id))?;
            if let Some(obj) = row.as_object_mut() {
                obj.insert("is_completed".into(), completed.into());
                let stamp = if completed {
                    serde_json::Value::String(Utc::now().to_rfc3339())
                } else {
                    serde_json::Value::Null
                };
                obj.insert("completed_at".into(), stamp);
            }
            Ok(row.clone())
        })?;

        self.log(WriteOp::Toggle {
            item_id: item_id.to_string(),
            completed,
        });
        Ok(updated)
    }

    async fn list(&self, collection: Collection, filters: &Filters) -> Result<Vec<Record>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(StoreOp::List)?;
        let tables = lock(&self.tables);
        let rows = tables
            .collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| {
                        filters.iter().all(|(col, want)| {
                            want.matches(r.get(col).unwrap_or(&serde_json::Value::Null))
                        })
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }
}
