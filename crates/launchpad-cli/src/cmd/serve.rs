use crate::cmd::block_on;
use anyhow::Context;
use launchpad_core::Config;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let port = port.unwrap_or(config.server.port);
    block_on(launchpad_server::serve(root.to_path_buf(), port))?
}
