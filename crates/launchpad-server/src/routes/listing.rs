use axum::extract::{Path, State};
use axum::Json;
use launchpad_core::types::ChecklistCategory;
use launchpad_core::ListingField;

use crate::error::AppError;
use crate::state::AppState;

/// Field name to status string, for every listing field.
async fn statuses(app: &AppState, slug: &str) -> Result<serde_json::Value, AppError> {
    let lp = &app.launchpad;
    let sync = lp.listing_synchronizer(slug).await?;
    // statuses read the cached snapshot; make sure there is one
    lp.checklist(sync.project_id(), ChecklistCategory::StoreListing)
        .await?;
    let map: serde_json::Map<String, serde_json::Value> = sync
        .statuses()
        .into_iter()
        .map(|(field, status)| (field.to_string(), status.as_str().into()))
        .collect();
    Ok(map.into())
}

/// GET /api/projects/:slug/listing: the store listing with field statuses.
pub async fn get_listing(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project = app.launchpad.project(&slug).await?;
    let listing = app.launchpad.listing(&project.id).await?;
    let status = statuses(&app, &slug).await?;
    Ok(Json(serde_json::json!({
        "listing": listing,
        "status": status,
    })))
}

/// GET /api/projects/:slug/listing/status
pub async fn get_listing_status(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(statuses(&app, &slug).await?))
}

#[derive(serde::Deserialize)]
pub struct SetFieldBody {
    pub value: String,
}

/// PUT /api/projects/:slug/listing/:field: save one field and reconcile its
/// checklist item.
pub async fn put_listing_field(
    State(app): State<AppState>,
    Path((slug, field)): Path<(String, String)>,
    Json(body): Json<SetFieldBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let field: ListingField = field.parse()?;
    let sync = app.launchpad.listing_synchronizer(&slug).await?;
    let outcome = sync.sync_field(field, &body.value).await?;
    Ok(Json(serde_json::json!({
        "field": outcome.field,
        "item_key": outcome.item_key,
        "toggled": outcome.toggled,
        "status": sync.field_status(field).as_str(),
    })))
}
