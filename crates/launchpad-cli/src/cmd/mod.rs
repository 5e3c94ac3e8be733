pub mod checklist;
pub mod config;
pub mod init;
pub mod listing;
pub mod serve;

use anyhow::Context;
use launchpad_core::{AnyStore, Config, Launchpad};
use std::path::Path;

/// The loaded config and a launchpad over the store it names.
pub struct Workspace {
    pub config: Config,
    pub launchpad: Launchpad<AnyStore>,
}

impl Workspace {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let store = AnyStore::from_config(root, &config).context("failed to open store")?;
        Ok(Self {
            config,
            launchpad: Launchpad::new(store),
        })
    }

    pub fn slug(&self) -> &str {
        &self.config.project.slug
    }
}

/// Run `fut` to completion on a fresh runtime.
pub fn block_on<F: std::future::Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    Ok(rt.block_on(fut))
}
