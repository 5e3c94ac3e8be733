use axum::extract::{Path, Query, State};
use axum::Json;
use launchpad_core::checklist;
use launchpad_core::types::ChecklistCategory;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct ChecklistQuery {
    pub category: Option<String>,
}

/// GET /api/projects/:slug/checklist?category=: checklist items, one
/// category or all of them.
pub async fn get_checklist(
    State(app): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ChecklistQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let categories = match query.category.as_deref() {
        Some(c) => vec![c.parse::<ChecklistCategory>()?],
        None => ChecklistCategory::all().to_vec(),
    };

    let project = app.launchpad.project(&slug).await?;
    let mut items = Vec::new();
    for category in categories {
        items.extend(app.launchpad.checklist(&project.id, category).await?);
    }

    Ok(Json(serde_json::json!({
        "project": project.slug,
        "category": query.category,
        "progress": checklist::progress(&items),
        "items": items,
    })))
}

#[derive(serde::Deserialize)]
pub struct ToggleBody {
    pub completed: bool,
}

/// POST /api/checklist/:item_id/toggle: set an item's completion flag.
pub async fn toggle_item(
    State(app): State<AppState>,
    Path(item_id): Path<String>,
    Json(body): Json<ToggleBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let item = app.launchpad.toggle_item(&item_id, body.completed).await?;
    Ok(Json(serde_json::to_value(item)?))
}
