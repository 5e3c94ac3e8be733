use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: the loaded `.launchpad/config.yaml` plus validation
/// warnings. Read-only; edits go through the file.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let warnings = app.config.validate();
    Ok(Json(serde_json::json!({
        "config": app.config.as_ref(),
        "store": app.launchpad.store().kind(),
        "warnings": warnings,
    })))
}
