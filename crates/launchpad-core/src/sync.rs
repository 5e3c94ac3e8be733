//! Keeps store-listing form values and the `store_listing` checklist in step.
//!
//! Saving a field writes the value first. Only once that write is
//! acknowledged is the matching checklist item looked up and, if its
//! completion flag disagrees with whether the value is filled, toggled.
//! Nothing is written when the flag already agrees, so re-running a sync with
//! the same value is free on the checklist side.
//!
//! The value write and the toggle are separate requests. If the toggle fails
//! the value stays saved and the flag lags until the next successful sync.
//!
//! Syncs of the same field run one at a time: a later call waits for the
//! earlier one to finish all three steps, so the last value written is the
//! one the flag ends up reflecting.

use crate::cache::{QueryCache, QueryKey};
use crate::checklist::{self, ChecklistItem};
use crate::error::Result;
use crate::launchpad::{cached_list, checklist_filters};
use crate::listing::{has_value, ListingField};
use crate::lock;
use crate::store::{Fields, RemoteStore};
use crate::types::{ChecklistCategory, Collection, FieldStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub field: ListingField,
    pub item_key: &'static str,
    /// New completion flag, when a toggle was written.
    pub toggled: Option<bool>,
}

pub struct FieldSynchronizer<S> {
    store: Arc<S>,
    cache: Arc<QueryCache>,
    project_id: String,
    listing_id: String,
    saving: Mutex<HashMap<ListingField, usize>>,
    turns: Mutex<HashMap<ListingField, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: RemoteStore> FieldSynchronizer<S> {
    pub fn new(
        store: Arc<S>,
        cache: Arc<QueryCache>,
        project_id: impl Into<String>,
        listing_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            project_id: project_id.into(),
            listing_id: listing_id.into(),
            saving: Mutex::new(HashMap::new()),
            turns: Mutex::new(HashMap::new()),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    /// Cache key of the checklist snapshot this synchronizer reads.
    pub fn checklist_key(&self) -> QueryKey {
        QueryKey::new(
            Collection::ChecklistItems,
            &checklist_filters(&self.project_id, ChecklistCategory::StoreListing),
        )
    }

    /// Save `value` into the field named `field_name` and reconcile its
    /// checklist item. Unknown names fail with `InvalidField` before any write.
    pub async fn sync(&self, field_name: &str, value: &str) -> Result<SyncOutcome> {
        let field: ListingField = field_name.parse()?;
        self.sync_field(field, value).await
    }

    pub async fn sync_field(&self, field: ListingField, value: &str) -> Result<SyncOutcome> {
        let _saving = SavingGuard::enter(&self.saving, field);
        let turn = Arc::clone(lock(&self.turns).entry(field).or_default());
        let _turn = turn.lock().await;
        let mut outcome = SyncOutcome {
            field,
            item_key: field.item_key(),
            toggled: None,
        };

        let mut fields = Fields::new();
        fields.insert(field.as_str().to_string(), value.into());
        if let Err(e) = self
            .store
            .update(Collection::StoreListings, &self.listing_id, fields)
            .await
        {
            warn!(%field, listing = %self.listing_id, error = %e, "value write failed; checklist untouched");
            return Err(e);
        }
        self.cache.invalidate_collection(Collection::StoreListings);

        let items = self.checklist().await?;
        let Some(item) = checklist::find_by_key(&items, field.item_key()) else {
            debug!(%field, item_key = field.item_key(), "no checklist item; value saved only");
            return Ok(outcome);
        };

        let filled = has_value(value);
        if item.is_completed == filled {
            debug!(%field, filled, "checklist already in sync");
            return Ok(outcome);
        }

        self.store.toggle(&item.id, filled).await?;
        info!(%field, item = %item.id, completed = filled, "checklist item toggled");
        self.cache.invalidate_collection(Collection::ChecklistItems);
        outcome.toggled = Some(filled);

        // Pull the new flag into the snapshot `status` reads. Both writes are
        // durable at this point, so a failed refetch is not the caller's error.
        if let Err(e) = self.checklist().await {
            warn!(error = %e, "checklist refetch after toggle failed");
        }

        Ok(outcome)
    }

    pub fn is_saving(&self, field: ListingField) -> bool {
        lock(&self.saving).contains_key(&field)
    }

    /// `saving` while a sync is in flight, else `filled`/`empty` from the
    /// latest cached checklist snapshot. Never touches the network.
    pub fn status(&self, field_name: &str) -> Result<FieldStatus> {
        let field: ListingField = field_name.parse()?;
        Ok(self.field_status(field))
    }

    pub fn field_status(&self, field: ListingField) -> FieldStatus {
        if self.is_saving(field) {
            return FieldStatus::Saving;
        }
        let completed = self
            .cached_checklist()
            .iter()
            .any(|i| i.item_key == field.item_key() && i.is_completed);
        if completed {
            FieldStatus::Filled
        } else {
            FieldStatus::Empty
        }
    }

    pub fn statuses(&self) -> Vec<(ListingField, FieldStatus)> {
        ListingField::all()
            .iter()
            .map(|f| (*f, self.field_status(*f)))
            .collect()
    }

    async fn checklist(&self) -> Result<Vec<ChecklistItem>> {
        let records = cached_list(
            &self.store,
            &self.cache,
            Collection::ChecklistItems,
            checklist_filters(&self.project_id, ChecklistCategory::StoreListing),
        )
        .await?;
        ChecklistItem::from_records(&records)
    }

    fn cached_checklist(&self) -> Vec<ChecklistItem> {
        self.cache
            .get(&self.checklist_key())
            .and_then(|entry| match entry.value {
                serde_json::Value::Array(rows) => ChecklistItem::from_records(&rows).ok(),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Marks a field as saving for as long as it lives.
struct SavingGuard<'a> {
    saving: &'a Mutex<HashMap<ListingField, usize>>,
    field: ListingField,
}

impl<'a> SavingGuard<'a> {
    fn enter(saving: &'a Mutex<HashMap<ListingField, usize>>, field: ListingField) -> Self {
        *lock(saving).entry(field).or_insert(0) += 1;
        Self { saving, field }
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        let mut saving = lock(self.saving);
        if let Some(count) = saving.get_mut(&self.field) {
            *count -= 1;
            if *count == 0 {
                saving.remove(&self.field);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LaunchpadError;
    use crate::store::{LocalStore, Record, StoreOp, WriteOp};
    use crate::types::Filters;
    use serde_json::json;
    use tokio::sync::Notify;

    async fn seeded_store(items: &[(&str, bool)]) -> Arc<LocalStore> {
        let store = LocalStore::in_memory();
        store
            .insert(
                Collection::StoreListings,
                json!({ "id": "l1", "project_id": "p1", "name": "MyApp", "keywords": "" }),
            )
            .await
            .unwrap();
        for (key, done) in items {
            store
                .insert(
                    Collection::ChecklistItems,
                    json!({
                        "id": format!("c-{key}"),
                        "project_id": "p1",
                        "category": "store_listing",
                        "item_key": key,
                        "title": key,
                        "is_completed": done,
                    }),
                )
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn synchronizer<S: RemoteStore>(store: Arc<S>) -> FieldSynchronizer<S> {
        FieldSynchronizer::new(store, Arc::new(QueryCache::new()), "p1", "l1")
    }

    fn value_writes(store: &LocalStore) -> usize {
        store
            .writes()
            .iter()
            .filter(|w| matches!(w, WriteOp::Update { .. }))
            .count()
    }

    #[tokio::test]
    async fn filling_keywords_marks_item_complete() {
        let store = seeded_store(&[("keywords", false)]).await;
        let sync = synchronizer(Arc::clone(&store));

        let outcome = sync.sync("keywords", "fitness, coach").await.unwrap();

        assert_eq!(outcome.toggled, Some(true));
        assert_eq!(outcome.item_key, "keywords");
        assert_eq!(store.toggle_writes(), 1);
        assert_eq!(sync.status("keywords").unwrap(), FieldStatus::Filled);
        let listing = store.get(Collection::StoreListings, "l1").await.unwrap();
        assert_eq!(listing["keywords"], "fitness, coach");
    }

    #[tokio::test]
    async fn clearing_name_unmarks_app_title() {
        let store = seeded_store(&[("app_title", true)]).await;
        let sync = synchronizer(Arc::clone(&store));

        let outcome = sync.sync("name", "").await.unwrap();

        assert_eq!(outcome.item_key, "app_title");
        assert_eq!(outcome.toggled, Some(false));
        assert_eq!(
            store.writes().last(),
            Some(&WriteOp::Toggle {
                item_id: "c-app_title".into(),
                completed: false
            })
        );
        assert_eq!(sync.status("name").unwrap(), FieldStatus::Empty);
    }

    #[tokio::test]
    async fn field_without_checklist_item_only_writes_value() {
        let store = seeded_store(&[("app_title", true)]).await;
        let sync = synchronizer(Arc::clone(&store));
        let before = store.writes().len();

        let outcome = sync.sync("content_rating", "12+").await.unwrap();

        assert_eq!(outcome.toggled, None);
        assert_eq!(store.writes().len(), before + 1);
        assert_eq!(store.toggle_writes(), 0);
        assert_eq!(sync.status("content_rating").unwrap(), FieldStatus::Empty);
    }

    #[tokio::test]
    async fn repeated_sync_toggles_once() {
        for value in ["fitness, coach", ""] {
            let initially = !has_value(value);
            let store = seeded_store(&[("keywords", initially)]).await;
            let sync = synchronizer(Arc::clone(&store));

            sync.sync("keywords", value).await.unwrap();
            let second = sync.sync("keywords", value).await.unwrap();

            assert_eq!(second.toggled, None);
            assert_eq!(store.toggle_writes(), 1, "value {value:?}");
            assert_eq!(value_writes(&store), 2);
        }
    }

    #[tokio::test]
    async fn agreeing_flag_issues_no_toggle() {
        let store = seeded_store(&[("keywords", true), ("subtitle", false)]).await;
        let sync = synchronizer(Arc::clone(&store));

        sync.sync("keywords", "already there").await.unwrap();
        sync.sync("subtitle", "   ").await.unwrap();

        assert_eq!(store.toggle_writes(), 0);
    }

    #[tokio::test]
    async fn unknown_field_fails_without_writes() {
        let store = seeded_store(&[("keywords", false)]).await;
        let sync = synchronizer(Arc::clone(&store));
        let before = store.writes().len();

        let err = sync.sync("app_icon", "icon.png").await.unwrap_err();

        assert!(matches!(err, LaunchpadError::InvalidField(ref f) if f == "app_icon"));
        assert_eq!(store.writes().len(), before);
        assert!(matches!(
            sync.status("app_icon"),
            Err(LaunchpadError::InvalidField(_))
        ));
    }

    #[tokio::test]
    async fn failed_value_write_skips_checklist() {
        let store = seeded_store(&[("keywords", false)]).await;
        let sync = synchronizer(Arc::clone(&store));
        store.fail_next(StoreOp::Update);

        let err = sync.sync("keywords", "fitness").await.unwrap_err();

        assert!(matches!(err, LaunchpadError::Persistence(_)));
        assert_eq!(store.toggle_writes(), 0);
        assert_eq!(store.list_calls(), 0);
        assert!(!sync.is_saving(ListingField::Keywords));
    }

    #[tokio::test]
    async fn failed_toggle_keeps_value_and_retry_converges() {
        let store = seeded_store(&[("keywords", false)]).await;
        let sync = synchronizer(Arc::clone(&store));
        store.fail_next(StoreOp::Toggle);

        let err = sync.sync("keywords", "fitness").await.unwrap_err();
        assert!(matches!(err, LaunchpadError::Persistence(_)));
        let listing = store.get(Collection::StoreListings, "l1").await.unwrap();
        assert_eq!(listing["keywords"], "fitness");
        assert_eq!(sync.status("keywords").unwrap(), FieldStatus::Empty);

        let retry = sync.sync("keywords", "fitness").await.unwrap();
        assert_eq!(retry.toggled, Some(true));
        assert_eq!(sync.status("keywords").unwrap(), FieldStatus::Filled);
    }

    #[tokio::test]
    async fn value_write_invalidates_cached_listing() {
        let store = seeded_store(&[]).await;
        let cache = Arc::new(QueryCache::new());
        let sync = FieldSynchronizer::new(Arc::clone(&store), Arc::clone(&cache), "p1", "l1");
        let key = QueryKey::record(Collection::StoreListings, "l1");
        cache
            .fetch(&key, || async { Ok(json!({ "id": "l1" })) })
            .await
            .unwrap();

        sync.sync("subtitle", "Train smarter").await.unwrap();

        assert_eq!(
            cache.get(&key).unwrap().staleness,
            crate::cache::Staleness::Stale
        );
    }

    // -- saving marker -----------------------------------------------------

    /// Holds every value write until released.
    struct GatedStore {
        inner: Arc<LocalStore>,
        gate: Arc<Notify>,
        entered: Arc<Notify>,
    }

    impl RemoteStore for GatedStore {
        async fn get(&self, c: Collection, id: &str) -> Result<Record> {
            self.inner.get(c, id).await
        }
        async fn insert(&self, c: Collection, r: Record) -> Result<Record> {
            self.inner.insert(c, r).await
        }
        async fn update(&self, c: Collection, id: &str, f: Fields) -> Result<Record> {
            self.entered.notify_one();
            self.gate.notified().await;
            self.inner.update(c, id, f).await
        }
        async fn toggle(&self, id: &str, done: bool) -> Result<Record> {
            self.inner.toggle(id, done).await
        }
        async fn list(&self, c: Collection, f: &Filters) -> Result<Vec<Record>> {
            self.inner.list(c, f).await
        }
    }

    #[tokio::test]
    async fn field_reports_saving_while_in_flight() {
        let inner = seeded_store(&[("keywords", false), ("subtitle", true)]).await;
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let sync = Arc::new(synchronizer(Arc::new(GatedStore {
            inner,
            gate: Arc::clone(&gate),
            entered: Arc::clone(&entered),
        })));

        let s = Arc::clone(&sync);
        let task = tokio::spawn(async move { s.sync("keywords", "fitness").await });
        entered.notified().await;

        assert_eq!(sync.status("keywords").unwrap(), FieldStatus::Saving);
        // other fields are unaffected
        assert!(!sync.is_saving(ListingField::Subtitle));

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(sync.status("keywords").unwrap(), FieldStatus::Filled);
    }

    /// Parks the first value write after it reaches the store.
    struct SlowFirstWrite {
        inner: Arc<LocalStore>,
        held: std::sync::atomic::AtomicBool,
        gate: Arc<Notify>,
        written: Arc<Notify>,
    }

    impl RemoteStore for SlowFirstWrite {
        async fn get(&self, c: Collection, id: &str) -> Result<Record> {
            self.inner.get(c, id).await
        }
        async fn insert(&self, c: Collection, r: Record) -> Result<Record> {
            self.inner.insert(c, r).await
        }
        async fn update(&self, c: Collection, id: &str, f: Fields) -> Result<Record> {
            let rec = self.inner.update(c, id, f).await?;
            if !self.held.swap(true, std::sync::atomic::Ordering::SeqCst) {
                self.written.notify_one();
                self.gate.notified().await;
            }
            Ok(rec)
        }
        async fn toggle(&self, id: &str, done: bool) -> Result<Record> {
            self.inner.toggle(id, done).await
        }
        async fn list(&self, c: Collection, f: &Filters) -> Result<Vec<Record>> {
            self.inner.list(c, f).await
        }
    }

    #[tokio::test]
    async fn overlapping_syncs_of_one_field_settle_on_last_value() {
        let inner = seeded_store(&[("keywords", false)]).await;
        let gate = Arc::new(Notify::new());
        let written = Arc::new(Notify::new());
        let sync = Arc::new(synchronizer(Arc::new(SlowFirstWrite {
            inner: Arc::clone(&inner),
            held: Default::default(),
            gate: Arc::clone(&gate),
            written: Arc::clone(&written),
        })));

        let s = Arc::clone(&sync);
        let first = tokio::spawn(async move { s.sync("keywords", "fitness").await });
        written.notified().await;

        let s = Arc::clone(&sync);
        let second = tokio::spawn(async move { s.sync("keywords", "").await });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        // the second sync waits its turn instead of writing
        assert_eq!(value_writes(&inner), 1);
        assert_eq!(sync.status("keywords").unwrap(), FieldStatus::Saving);

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap().toggled, Some(true));
        assert_eq!(second.await.unwrap().unwrap().toggled, Some(false));

        let listing = inner.get(Collection::StoreListings, "l1").await.unwrap();
        assert_eq!(listing["keywords"], "");
        let item = inner.get(Collection::ChecklistItems, "c-keywords").await.unwrap();
        assert_eq!(item["is_completed"], false);
        assert_eq!(sync.status("keywords").unwrap(), FieldStatus::Empty);
    }

    #[tokio::test]
    async fn statuses_cover_every_field() {
        let store = seeded_store(&[("app_title", true)]).await;
        let sync = synchronizer(Arc::clone(&store));
        sync.sync("name", "MyApp").await.unwrap();

        let statuses = sync.statuses();
        assert_eq!(statuses.len(), ListingField::all().len());
        assert!(statuses.contains(&(ListingField::Name, FieldStatus::Filled)));
        assert!(statuses.contains(&(ListingField::Keywords, FieldStatus::Empty)));
    }
}
