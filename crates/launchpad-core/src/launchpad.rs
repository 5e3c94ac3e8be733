use crate::cache::{QueryCache, QueryKey};
use crate::checklist::{self, ChecklistItem, Progress};
use crate::error::{LaunchpadError, Result};
use crate::listing::{ListingField, StoreListing};
use crate::lock;
use crate::project::{self, Project};
use crate::session::EditSession;
use crate::store::{Record, RemoteStore};
use crate::sync::FieldSynchronizer;
use crate::types::{filters, ChecklistCategory, Collection, Filters};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Filters selecting one category of a project's checklist.
pub fn checklist_filters(project_id: &str, category: ChecklistCategory) -> Filters {
    filters([("project_id", project_id), ("category", category.as_str())])
}

/// List `collection` through the cache, loading from `store` on a miss.
pub(crate) async fn cached_list<S: RemoteStore>(
    store: &Arc<S>,
    cache: &QueryCache,
    collection: Collection,
    filters: Filters,
) -> Result<Vec<Record>> {
    let key = QueryKey::new(collection, &filters);
    let store = Arc::clone(store);
    let value = cache
        .fetch(&key, move || async move {
            store
                .list(collection, &filters)
                .await
                .map(serde_json::Value::Array)
        })
        .await?;
    Ok(match value {
        serde_json::Value::Array(rows) => rows,
        _ => Vec::new(),
    })
}

/// One row of the project overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCard {
    pub project: Project,
    /// App title from the store listing, when set.
    pub title: Option<String>,
    pub progress: Progress,
}

/// Entry point wiring a remote store to the process-wide query cache.
pub struct Launchpad<S> {
    store: Arc<S>,
    cache: Arc<QueryCache>,
    synchronizers: Mutex<HashMap<String, Arc<FieldSynchronizer<S>>>>,
}

impl<S: RemoteStore> Launchpad<S> {
    pub fn new(store: S) -> Self {
        Self::with_cache(Arc::new(store), Arc::new(QueryCache::new()))
    }

    pub fn with_cache(store: Arc<S>, cache: Arc<QueryCache>) -> Self {
        Self {
            store,
            cache,
            synchronizers: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn projects(&self) -> Result<Vec<Project>> {
        let rows =
            cached_list(&self.store, &self.cache, Collection::Projects, Filters::new()).await?;
        rows.iter().map(Project::from_record).collect()
    }

    pub async fn project(&self, slug: &str) -> Result<Project> {
        let rows = cached_list(
            &self.store,
            &self.cache,
            Collection::Projects,
            filters([("slug", slug)]),
        )
        .await?;
        rows.first()
            .map(Project::from_record)
            .transpose()?
            .ok_or_else(|| LaunchpadError::not_found(Collection::Projects.as_str(), slug))
    }

    pub async fn listing(&self, project_id: &str) -> Result<StoreListing> {
        let rows = cached_list(
            &self.store,
            &self.cache,
            Collection::StoreListings,
            filters([("project_id", project_id)]),
        )
        .await?;
        rows.first()
            .map(StoreListing::from_record)
            .transpose()?
            .ok_or_else(|| {
                LaunchpadError::not_found(Collection::StoreListings.as_str(), project_id)
            })
    }

    pub async fn checklist(
        &self,
        project_id: &str,
        category: ChecklistCategory,
    ) -> Result<Vec<ChecklistItem>> {
        let rows = cached_list(
            &self.store,
            &self.cache,
            Collection::ChecklistItems,
            checklist_filters(project_id, category),
        )
        .await?;
        ChecklistItem::from_records(&rows)
    }

    /// Every project with its listing title and overall checklist progress.
    ///
    /// Cached under the `projects` collection; writes to checklists and
    /// listings reach it through the declared dependents.
    pub async fn overview(&self) -> Result<Vec<ProjectCard>> {
        let key = QueryKey::new(Collection::Projects, &filters([("view", "overview")]));
        let store = Arc::clone(&self.store);
        let value = self
            .cache
            .fetch(&key, move || async move {
                let cards = build_overview(store.as_ref()).await?;
                Ok(serde_json::to_value(cards)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    pub async fn init_project(&self, slug: &str, name: &str) -> Result<Project> {
        let project = project::initialize_project(self.store.as_ref(), slug, name).await?;
        self.cache.invalidate_collection(Collection::Projects);
        self.cache.invalidate_collection(Collection::StoreListings);
        self.cache.invalidate_collection(Collection::ChecklistItems);
        Ok(project)
    }

    /// A user ticking or unticking a checklist item directly.
    pub async fn toggle_item(&self, item_id: &str, completed: bool) -> Result<ChecklistItem> {
        let record = self.store.toggle(item_id, completed).await?;
        self.cache.invalidate_collection(Collection::ChecklistItems);
        tracing::info!(item = item_id, completed, "checklist item toggled by user");
        ChecklistItem::from_record(&record)
    }

    // -----------------------------------------------------------------------
    // Synchronization
    // -----------------------------------------------------------------------

    /// The synchronizer for one listing. Repeated calls return the same
    /// instance so saving markers are visible to every caller.
    pub fn synchronizer(&self, project_id: &str, listing_id: &str) -> Arc<FieldSynchronizer<S>> {
        let mut map = lock(&self.synchronizers);
        Arc::clone(map.entry(listing_id.to_string()).or_insert_with(|| {
            Arc::new(FieldSynchronizer::new(
                Arc::clone(&self.store),
                Arc::clone(&self.cache),
                project_id,
                listing_id,
            ))
        }))
    }

    pub async fn listing_synchronizer(&self, slug: &str) -> Result<Arc<FieldSynchronizer<S>>> {
        let project = self.project(slug).await?;
        let listing = self.listing(&project.id).await?;
        Ok(self.synchronizer(&project.id, &listing.id))
    }

    /// Start an edit session hydrated from the project's current listing.
    /// The checklist snapshot is loaded too so statuses are available
    /// immediately.
    pub async fn edit_session(&self, slug: &str) -> Result<EditSession<S>> {
        let project = self.project(slug).await?;
        let listing = self.listing(&project.id).await?;
        self.checklist(&project.id, ChecklistCategory::StoreListing)
            .await?;
        let sync = self.synchronizer(&project.id, &listing.id);
        Ok(EditSession::hydrate(sync, &listing))
    }
}

async fn build_overview<S: RemoteStore>(store: &S) -> Result<Vec<ProjectCard>> {
    let projects = store.list(Collection::Projects, &Filters::new()).await?;
    let listings = store
        .list(Collection::StoreListings, &Filters::new())
        .await?;
    let items = store
        .list(Collection::ChecklistItems, &Filters::new())
        .await?;
    let listings = listings
        .iter()
        .map(StoreListing::from_record)
        .collect::<Result<Vec<_>>>()?;
    let items = ChecklistItem::from_records(&items)?;

    projects
        .iter()
        .map(|rec| {
            let project = Project::from_record(rec)?;
            let title = listings
                .iter()
                .find(|l| l.project_id == project.id)
                .and_then(|l| l.value(ListingField::Name))
                .map(str::to_string);
            let own: Vec<ChecklistItem> = items
                .iter()
                .filter(|i| i.project_id == project.id)
                .cloned()
                .collect();
            Ok(ProjectCard {
                progress: checklist::progress(&own),
                project,
                title,
            })
        })
        .collect()
}
