pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Projects
        .route("/api/projects", get(routes::projects::list_projects))
        .route("/api/projects/{slug}", get(routes::projects::get_project))
        // Checklist
        .route(
            "/api/projects/{slug}/checklist",
            get(routes::checklist::get_checklist),
        )
        .route(
            "/api/checklist/{item_id}/toggle",
            post(routes::checklist::toggle_item),
        )
        // Listing
        .route(
            "/api/projects/{slug}/listing",
            get(routes::listing::get_listing),
        )
        .route(
            "/api/projects/{slug}/listing/status",
            get(routes::listing::get_listing_status),
        )
        .route(
            "/api/projects/{slug}/listing/{field}",
            put(routes::listing::put_listing_field),
        )
        // Config
        .route("/api/config", get(routes::config::get_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server for the project at `root`.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve_on(root, listener).await
}

/// Start the API server on a pre-bound listener, so the caller can read the
/// actual port first when binding port 0.
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = state::AppState::new(root)?;
    let project = app_state.config.project.slug.clone();
    let app = build_router(app_state);

    tracing::info!(%project, "launchpad API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
