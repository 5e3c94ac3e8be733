use axum::http::StatusCode;
use http_body_util::BodyExt;
use launchpad_core::config::Config;
use launchpad_server::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write a config into `dir` and seed one project in its local store.
async fn init_app(dir: &TempDir) -> axum::Router {
    Config::new("fitness-coach", "Fitness Coach")
        .save(dir.path())
        .unwrap();
    let state = AppState::new(dir.path().to_path_buf()).unwrap();
    state
        .launchpad
        .init_project("fitness-coach", "Fitness Coach")
        .await
        .unwrap();
    launchpad_server::build_router(state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => axum::body::Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_projects_returns_overview_cards() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, json) = get(&app, "/api/projects").await;

    assert_eq!(status, StatusCode::OK);
    let cards = json.as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["project"]["slug"], "fitness-coach");
    assert_eq!(cards[0]["progress"]["completed"], 0);
}

#[tokio::test]
async fn get_unknown_project_is_404() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, json) = get(&app, "/api/projects/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn project_detail_has_every_category() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, json) = get(&app, "/api/projects/fitness-coach").await;

    assert_eq!(status, StatusCode::OK);
    for category in ["store_listing", "pre_launch", "launch_day", "post_launch"] {
        assert!(json["checklists"][category]["progress"]["total"].as_u64().unwrap() > 0);
    }
}

#[tokio::test]
async fn put_field_toggles_checklist_and_reports_filled() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, json) = send(
        &app,
        "PUT",
        "/api/projects/fitness-coach/listing/keywords",
        Some(serde_json::json!({ "value": "fitness, coach" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["item_key"], "keywords");
    assert_eq!(json["toggled"], true);
    assert_eq!(json["status"], "filled");

    let (_, items) = get(
        &app,
        "/api/projects/fitness-coach/checklist?category=store_listing",
    )
    .await;
    let keywords = items["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["item_key"] == "keywords")
        .unwrap();
    assert_eq!(keywords["is_completed"], true);

    let (_, statuses) = get(&app, "/api/projects/fitness-coach/listing/status").await;
    assert_eq!(statuses["keywords"], "filled");
    assert_eq!(statuses["subtitle"], "empty");
}

#[tokio::test]
async fn put_same_value_twice_toggles_once() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;
    let uri = "/api/projects/fitness-coach/listing/name";
    let body = serde_json::json!({ "value": "Fitness Coach" });

    let (_, first) = send(&app, "PUT", uri, Some(body.clone())).await;
    let (_, second) = send(&app, "PUT", uri, Some(body)).await;

    assert_eq!(first["toggled"], true);
    assert_eq!(second["toggled"], serde_json::Value::Null);
}

#[tokio::test]
async fn put_unknown_field_is_400() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, json) = send(
        &app,
        "PUT",
        "/api/projects/fitness-coach/listing/app_icon",
        Some(serde_json::json!({ "value": "icon.png" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("app_icon"));
}

#[tokio::test]
async fn unknown_category_is_400() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, _) = get(&app, "/api/projects/fitness-coach/checklist?category=someday").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggle_item_directly() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;
    let (_, json) = get(&app, "/api/projects/fitness-coach/checklist?category=launch_day").await;
    let id = json["items"][0]["id"].as_str().unwrap().to_string();

    let (status, item) = send(
        &app,
        "POST",
        &format!("/api/checklist/{id}/toggle"),
        Some(serde_json::json!({ "completed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["is_completed"], true);
    assert!(item["completed_at"].is_string());

    let (_, json) = get(&app, "/api/projects/fitness-coach/checklist?category=launch_day").await;
    assert_eq!(json["progress"]["completed"], 1);
}

#[tokio::test]
async fn toggle_missing_item_is_404() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/checklist/missing/toggle",
        Some(serde_json::json!({ "completed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_listing_includes_values_and_status() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;
    send(
        &app,
        "PUT",
        "/api/projects/fitness-coach/listing/subtitle",
        Some(serde_json::json!({ "value": "Train smarter" })),
    )
    .await;

    let (status, json) = get(&app, "/api/projects/fitness-coach/listing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["listing"]["subtitle"], "Train smarter");
    assert_eq!(json["status"]["subtitle"], "filled");
}

#[tokio::test]
async fn get_config_returns_project_config() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;

    let (status, json) = get(&app, "/api/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config"]["project"]["slug"], "fitness-coach");
    assert_eq!(json["config"]["store"]["type"], "local");
    assert_eq!(json["store"], "local");
}

#[tokio::test]
async fn writes_persist_to_the_store_file() {
    let dir = TempDir::new().unwrap();
    let app = init_app(&dir).await;
    send(
        &app,
        "PUT",
        "/api/projects/fitness-coach/listing/name",
        Some(serde_json::json!({ "value": "Fitness Coach" })),
    )
    .await;

    // a fresh state reads the same file
    let reopened = AppState::new(dir.path().to_path_buf()).unwrap();
    let project = reopened.launchpad.project("fitness-coach").await.unwrap();
    let listing = reopened.launchpad.listing(&project.id).await.unwrap();
    assert_eq!(listing.name.as_deref(), Some("Fitness Coach"));
}
