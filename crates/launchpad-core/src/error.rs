use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchpadError {
    #[error("not initialized: run 'launchpad init'")]
    NotInitialized,

    #[error("unknown listing field: {0}")]
    InvalidField(String),

    #[error("remote store write failed: {0}")]
    Persistence(String),

    #[error("{collection} record not found: {id}")]
    NotFound { collection: String, id: String },

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    #[error("invalid checklist category: {0}")]
    InvalidCategory(String),

    #[error("malformed record in {collection}: {reason}")]
    MalformedRecord { collection: String, reason: String },

    /// A failure observed by every caller that joined the same in-flight load.
    #[error(transparent)]
    Shared(Arc<LaunchpadError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LaunchpadError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// The underlying error, looking through `Shared` wrappers.
    pub fn root(&self) -> &LaunchpadError {
        match self {
            LaunchpadError::Shared(inner) => inner.root(),
            other => other,
        }
    }

    /// Unwrap a shared failure when this caller holds the last reference.
    pub(crate) fn from_shared(err: Arc<LaunchpadError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(LaunchpadError::Shared)
    }
}

pub type Result<T> = std::result::Result<T, LaunchpadError>;
