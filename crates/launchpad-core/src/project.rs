use crate::checklist::{self, ChecklistItem};
use crate::error::{LaunchpadError, Result};
use crate::listing::StoreListing;
use crate::paths::validate_slug;
use crate::store::RemoteStore;
use crate::types::{filters, ChecklistCategory, Collection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    pub fn from_record(record: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(record.clone()).map_err(|e| LaunchpadError::MalformedRecord {
            collection: Collection::Projects.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Create a project with an empty store listing and every category's
/// default checklist.
pub async fn initialize_project<S: RemoteStore>(
    store: &S,
    slug: &str,
    name: &str,
) -> Result<Project> {
    validate_slug(slug)?;
    let existing = store
        .list(Collection::Projects, &filters([("slug", slug)]))
        .await?;
    if !existing.is_empty() {
        return Err(LaunchpadError::ProjectExists(slug.to_string()));
    }

    let project = Project::new(slug, name);
    store
        .insert(Collection::Projects, serde_json::to_value(&project)?)
        .await?;

    let listing = StoreListing::new(Uuid::new_v4().to_string(), project.id.clone());
    store
        .insert(Collection::StoreListings, serde_json::to_value(&listing)?)
        .await?;

    let mut seeded = 0;
    for category in ChecklistCategory::all() {
        for (key, title) in checklist::template(*category) {
            let item = ChecklistItem::new(
                Uuid::new_v4().to_string(),
                project.id.clone(),
                *category,
                *key,
                *title,
            );
            store
                .insert(Collection::ChecklistItems, serde_json::to_value(&item)?)
                .await?;
            seeded += 1;
        }
    }

    tracing::info!(slug, project = %project.id, items = seeded, "project initialized");
    Ok(project)
}
