use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use launchpad_core::LaunchpadError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// A 400 for request data the core never saw.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequest(msg.into()).into())
    }
}

#[derive(Debug)]
struct BadRequest(String);

impl std::fmt::Display for BadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BadRequest {}

fn status_for(err: &LaunchpadError) -> StatusCode {
    match err.root() {
        LaunchpadError::InvalidField(_)
        | LaunchpadError::InvalidSlug(_)
        | LaunchpadError::InvalidCollection(_)
        | LaunchpadError::InvalidCategory(_) => StatusCode::BAD_REQUEST,
        LaunchpadError::NotFound { .. } => StatusCode::NOT_FOUND,
        LaunchpadError::ProjectExists(_) => StatusCode::CONFLICT,
        LaunchpadError::Persistence(_) => StatusCode::BAD_GATEWAY,
        LaunchpadError::NotInitialized
        | LaunchpadError::MalformedRecord { .. }
        | LaunchpadError::Shared(_)
        | LaunchpadError::Io(_)
        | LaunchpadError::Yaml(_)
        | LaunchpadError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<BadRequest>().is_some() {
            StatusCode::BAD_REQUEST
        } else if let Some(e) = self.0.downcast_ref::<LaunchpadError>() {
            status_for(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
