use axum::extract::{Path, State};
use axum::Json;
use launchpad_core::checklist;
use launchpad_core::types::ChecklistCategory;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/projects: every project with its listing title and progress.
pub async fn list_projects(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let cards = app.launchpad.overview().await?;
    Ok(Json(serde_json::to_value(cards)?))
}

/// GET /api/projects/:slug: project detail with per-category progress.
pub async fn get_project(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lp = &app.launchpad;
    let project = lp.project(&slug).await?;

    let mut categories = serde_json::Map::new();
    for category in ChecklistCategory::all() {
        let items = lp.checklist(&project.id, *category).await?;
        categories.insert(
            category.to_string(),
            serde_json::json!({
                "progress": checklist::progress(&items),
                "summary": checklist::summarize(&items),
            }),
        );
    }

    Ok(Json(serde_json::json!({
        "id": project.id,
        "slug": project.slug,
        "name": project.name,
        "created_at": project.created_at,
        "checklists": categories,
    })))
}
