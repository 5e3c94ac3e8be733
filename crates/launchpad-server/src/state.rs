use launchpad_core::config::Config;
use launchpad_core::{AnyStore, Launchpad};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub launchpad: Arc<Launchpad<AnyStore>>,
}

impl AppState {
    /// Load `.launchpad/config.yaml` under `root` and open the configured store.
    pub fn new(root: PathBuf) -> launchpad_core::Result<Self> {
        let config = Config::load(&root)?;
        let store = AnyStore::from_config(&root, &config)?;
        tracing::debug!(store = store.kind(), root = %root.display(), "store opened");
        Ok(Self::with_launchpad(root, config, Launchpad::new(store)))
    }

    pub fn with_launchpad(root: PathBuf, config: Config, launchpad: Launchpad<AnyStore>) -> Self {
        Self {
            root,
            config: Arc::new(config),
            launchpad: Arc::new(launchpad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn uninitialized_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = AppState::new(dir.path().to_path_buf()).err().unwrap();
        assert!(matches!(err, launchpad_core::LaunchpadError::NotInitialized));
    }

    #[test]
    fn new_state_opens_local_store() {
        let dir = TempDir::new().unwrap();
        Config::new("app", "App").save(dir.path()).unwrap();
        let state = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.root, dir.path());
        assert_eq!(state.launchpad.store().kind(), "local");
    }
}
