//! CLI configuration: thin wrapper around `dlpsync_config`.
//!
//! Resolves which file to read from `GlobalOpts` (the `--config` flag
//! already folds in `DLPSYNC_CONFIG`) and turns it into the runtime
//! `SyncConfig`.

use std::path::PathBuf;

use dlpsync_config::Config;
use dlpsync_core::SyncConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The file this invocation reads.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    dlpsync_config::resolve_path(global.config.as_deref())
}

/// Load the configuration file merged with `DLPSYNC_*` overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = active_path(global);
    tracing::debug!(path = %path.display(), "loading configuration");
    Ok(dlpsync_config::load_config(&path)?)
}

/// Load and resolve everything a sync run needs, credentials included.
pub fn load_sync_config(global: &GlobalOpts) -> Result<SyncConfig, CliError> {
    let cfg = load(global)?;
    Ok(dlpsync_config::to_sync_config(&cfg)?)
}
