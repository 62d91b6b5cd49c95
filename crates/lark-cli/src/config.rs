//! Config file discovery

use anyhow::{Context, Result};
use lark_vm_host::HostConfig;
use std::path::Path;

/// Looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "lark.toml";

/// Load `path`, else `./lark.toml` if present, else the defaults
pub fn load_config(path: Option<&Path>) -> Result<HostConfig> {
    if let Some(path) = path {
        return HostConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.is_file() {
        tracing::debug!(path = %default.display(), "using config from working directory");
        return HostConfig::load(default)
            .with_context(|| format!("loading config {}", default.display()));
    }
    Ok(HostConfig::default())
}
