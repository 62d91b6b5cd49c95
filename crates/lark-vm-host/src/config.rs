//! Host configuration
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! argv = ["--level", "2"]
//! debugger = false
//!
//! [permissions]
//! allow_read = ["./content"]
//! allow_write = ["./saves"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::capabilities::{Capabilities, CapabilitiesBuilder};
use crate::error::{HostError, HostResult};

/// Settings for the `avmplus` surface
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    /// Reported by `System.argv`
    pub argv: Vec<String>,

    /// Reported by `System.isDebugger`
    pub debugger: bool,

    /// File system grants
    pub permissions: PermissionsConfig,
}

/// File system grants from the config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Readable roots
    pub allow_read: Vec<String>,

    /// Writable roots
    pub allow_write: Vec<String>,
}

impl HostConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> HostResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> HostResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| HostError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Capabilities granted by the config file alone
    pub fn capabilities(&self) -> Capabilities {
        let mut builder = CapabilitiesBuilder::new();
        if !self.permissions.allow_read.is_empty() {
            builder = builder.allow_read(self.permissions.allow_read.iter().map(PathBuf::from));
        }
        if !self.permissions.allow_write.is_empty() {
            builder = builder.allow_write(self.permissions.allow_write.iter().map(PathBuf::from));
        }
        builder.build()
    }
}
