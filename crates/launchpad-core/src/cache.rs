//! Process-wide cache of server-fetched collections.
//!
//! Entries are keyed by [`QueryKey`], a pure function of a collection and its
//! filters. Reads go through [`QueryCache::fetch`], which serves fresh values,
//! coalesces concurrent loads of the same key and re-runs the loader once an
//! entry has been invalidated. Writers call [`QueryCache::invalidate`] (or
//! [`QueryCache::invalidate_collection`]) after every mutation.
//!
//! Each slot carries a generation counter bumped on invalidation. A load
//! remembers the generation it started in: it may only mark its result fresh
//! if no invalidation happened meanwhile, and it never replaces a value that
//! was loaded in a later generation. A fetch issued after an invalidation
//! therefore never observes data older than a fetch issued before it.

use crate::error::{LaunchpadError, Result};
use crate::types::{Collection, Filters, Scalar};
use crate::lock;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

// ---------------------------------------------------------------------------
// QueryKey
// ---------------------------------------------------------------------------

/// Ordered tuple of scalars: `[collection, col1, val1, col2, val2, ...]` with
/// columns in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryKey(Vec<Scalar>);

impl QueryKey {
    /// Key prefix matching every query against `collection`.
    pub fn collection(collection: Collection) -> Self {
        QueryKey(vec![Scalar::Str(collection.as_str().to_string())])
    }

    pub fn new(collection: Collection, filters: &Filters) -> Self {
        let mut parts = Vec::with_capacity(1 + filters.len() * 2);
        parts.push(Scalar::Str(collection.as_str().to_string()));
        for (col, value) in filters {
            parts.push(Scalar::Str(col.clone()));
            parts.push(value.clone());
        }
        QueryKey(parts)
    }

    /// Key for a single record fetched by id.
    pub fn record(collection: Collection, id: &str) -> Self {
        QueryKey(vec![
            Scalar::Str(collection.as_str().to_string()),
            Scalar::Str("id".to_string()),
            Scalar::Str(id.to_string()),
        ])
    }

    pub fn from_parts(parts: Vec<Scalar>) -> Self {
        QueryKey(parts)
    }

    pub fn parts(&self) -> &[Scalar] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    fn overlaps(&self, other: &QueryKey) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Scalar::to_query_value).collect();
        f.write_str(&parts.join("/"))
    }
}

// ---------------------------------------------------------------------------
// Entries and events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: QueryKey,
    pub value: V,
    pub staleness: Staleness,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheEvent {
    /// Every entry under `prefix` was marked stale.
    Invalidated { prefix: QueryKey },
    /// A load for `key` completed and its value was stored.
    Refreshed { key: QueryKey },
}

type Shareable<V> = std::result::Result<V, Arc<LaunchpadError>>;
type SharedLoad<V> = Shared<BoxFuture<'static, Shareable<V>>>;

struct InFlight<V> {
    id: u64,
    epoch: u64,
    generation: u64,
    future: SharedLoad<V>,
}

struct Slot<V> {
    value: Option<V>,
    fresh: bool,
    generation: u64,
    value_generation: u64,
    inflight: Option<InFlight<V>>,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            value: None,
            fresh: false,
            generation: 0,
            value_generation: 0,
            inflight: None,
        }
    }
}

struct Inner<V> {
    slots: HashMap<QueryKey, Slot<V>>,
    next_load: u64,
    /// Bumped by `clear`; loads from an earlier epoch are never stored.
    epoch: u64,
}

// ---------------------------------------------------------------------------
// QueryCache
// ---------------------------------------------------------------------------

pub struct QueryCache<V = serde_json::Value> {
    inner: Arc<Mutex<Inner<V>>>,
    events: broadcast::Sender<CacheEvent>,
}

impl<V> Default for QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                next_load: 0,
                epoch: 0,
            })),
            events,
        }
    }

    /// Synchronous lookup. Never triggers a load.
    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry<V>> {
        let inner = lock(&self.inner);
        let slot = inner.slots.get(key)?;
        let value = slot.value.clone()?;
        Some(CacheEntry {
            key: key.clone(),
            value,
            staleness: if slot.fresh {
                Staleness::Fresh
            } else {
                Staleness::Stale
            },
        })
    }

    /// Whether a load for `key` is currently outstanding.
    pub fn is_loading(&self, key: &QueryKey) -> bool {
        lock(&self.inner)
            .slots
            .get(key)
            .is_some_and(|s| s.inflight.is_some())
    }

    /// Return the fresh value for `key`, or run `loader` to obtain one.
    ///
    /// Concurrent callers for the same key share one loader invocation. A
    /// failed load leaves the entry as it was and surfaces the error.
    /// `loader` is called with the cache lock held and must not call back
    /// into the cache before returning its future.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, loader: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let load = {
            let mut inner = lock(&self.inner);
            inner.next_load += 1;
            let id = inner.next_load;
            let epoch = inner.epoch;
            let slot = inner.slots.entry(key.clone()).or_insert_with(Slot::empty);

            if let (Some(value), true) = (&slot.value, slot.fresh) {
                debug!(%key, "cache hit");
                return Ok(value.clone());
            }

            // only loads started since the last invalidation may be joined
            let joinable = slot
                .inflight
                .as_ref()
                .filter(|l| l.epoch == epoch && l.generation == slot.generation)
                .map(|l| l.future.clone());

            match joinable {
                Some(future) => {
                    debug!(%key, "joining in-flight load");
                    future
                }
                None => {
                    debug!(%key, generation = slot.generation, "loading");
                    let generation = slot.generation;
                    let future =
                        self.start_load(key.clone(), id, epoch, generation, loader());
                    slot.inflight = Some(InFlight {
                        id,
                        epoch,
                        generation,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        load.await.map_err(LaunchpadError::from_shared)
    }

    fn start_load<Fut>(
        &self,
        key: QueryKey,
        id: u64,
        epoch: u64,
        generation: u64,
        load: Fut,
    ) -> SharedLoad<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        async move {
            let result = load.await;
            let stored = {
                let mut guard = lock(&inner);
                let current_epoch = guard.epoch;
                match guard.slots.get_mut(&key) {
                    // cleared while loading
                    _ if epoch != current_epoch => {
                        debug!(%key, "load outlived a clear; result dropped");
                        false
                    }
                    Some(slot) => {
                        if slot.inflight.as_ref().map(|l| l.id) == Some(id) {
                            slot.inflight = None;
                        }
                        match &result {
                            Ok(value)
                                if slot.value.is_none()
                                    || generation >= slot.value_generation =>
                            {
                                slot.value = Some(value.clone());
                                slot.value_generation = generation;
                                slot.fresh = generation == slot.generation;
                                true
                            }
                            Ok(_) => false,
                            Err(e) => {
                                debug!(%key, error = %e, "load failed; entry left unchanged");
                                false
                            }
                        }
                    }
                    // cleared while loading
                    None => false,
                }
            };
            if stored {
                let _ = events.send(CacheEvent::Refreshed { key });
            }
            result.map_err(Arc::new)
        }
        .boxed()
        .shared()
    }

    /// Mark every entry whose key starts with `prefix` as stale. Returns the
    /// number of entries affected.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut count = 0;
        {
            let mut inner = lock(&self.inner);
            for (key, slot) in inner.slots.iter_mut() {
                if key.starts_with(prefix) {
                    slot.generation += 1;
                    slot.fresh = false;
                    count += 1;
                }
            }
        }
        debug!(%prefix, count, "invalidated");
        let _ = self.events.send(CacheEvent::Invalidated {
            prefix: prefix.clone(),
        });
        count
    }

    /// Invalidate a collection and every collection declared dependent on it.
    pub fn invalidate_collection(&self, collection: Collection) -> usize {
        let mut count = self.invalidate(&QueryKey::collection(collection));
        for dep in collection.dependents() {
            count += self.invalidate(&QueryKey::collection(*dep));
        }
        count
    }

    /// Register interest in keys under `prefix`.
    pub fn subscribe(&self, prefix: QueryKey) -> Subscription {
        Subscription {
            prefix,
            rx: self.events.subscribe(),
        }
    }

    /// Raw event feed covering every key.
    pub fn events(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner)
            .slots
            .values()
            .filter(|s| s.value.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Loads still in flight complete for their callers but
    /// are not stored.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        inner.epoch += 1;
        inner.slots.clear();
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Receives cache events for keys under one prefix.
pub struct Subscription {
    prefix: QueryKey,
    rx: broadcast::Receiver<CacheEvent>,
}

impl Subscription {
    pub fn prefix(&self) -> &QueryKey {
        &self.prefix
    }

    /// Next event touching this subscription's keys, or `None` once the
    /// cache is gone. Events missed by a lagging subscriber are skipped.
    pub async fn next(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    let relevant = match &event {
                        CacheEvent::Refreshed { key } => key.starts_with(&self.prefix),
                        CacheEvent::Invalidated { prefix } => prefix.overlaps(&self.prefix),
                    };
                    if relevant {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
