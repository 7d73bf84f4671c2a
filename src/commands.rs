pub mod build;
pub mod check;
pub mod clean;
pub mod init;

use std::path::{Path, PathBuf};

use crate::build::{Builder, CancelSignal, base_path_from_config, cancel_channel};
use crate::config::{Config, resolve_config_path};

/// Load the config and set up a builder rooted at the config file's directory.
fn load_builder(config_file: Option<&Path>) -> Result<(Builder, PathBuf), anyhow::Error> {
    let config_path = resolve_config_path(config_file)?;
    let config = Config::load_from_file(&config_path)?;
    let base_path = base_path_from_config(&config_path);
    Ok((Builder::new(config, base_path), config_path))
}

/// A cancel signal tripped by Ctrl-C.
fn cancel_on_ctrl_c() -> CancelSignal {
    let (handle, signal) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing pages already started");
            handle.cancel();
        }
    });
    signal
}
