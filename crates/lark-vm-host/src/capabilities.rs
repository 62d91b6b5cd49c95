//! Capability-based access to the host file system
//!
//! Deny by default: a script can touch the file system only through paths
//! the embedder granted.
//!
//! # Example
//!
//! ```
//! use lark_vm_host::capabilities::{Capabilities, CapabilitiesBuilder};
//! use std::path::PathBuf;
//!
//! let caps = Capabilities::none();
//! assert!(!caps.can_read("/etc/passwd"));
//!
//! let caps = CapabilitiesBuilder::new()
//!     .allow_read(vec![PathBuf::from("/srv/content")])
//!     .build();
//! assert!(caps.can_read("/srv/content/intro.bin"));
//! assert!(!caps.can_read("/etc/passwd"));
//! ```

use std::path::{Path, PathBuf};

use lark_vm_core::VmError;
use thiserror::Error;

/// Capabilities granted to the host surface.
///
/// Each list is `None` when denied, empty when every path is allowed, and
/// otherwise holds the allowed roots (subdirectories included).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// File read access
    pub fs_read: Option<Vec<PathBuf>>,

    /// File write access
    pub fs_write: Option<Vec<PathBuf>>,
}

impl Capabilities {
    /// Everything denied
    pub fn none() -> Self {
        Self::default()
    }

    /// Everything allowed; only for trusted content
    pub fn all() -> Self {
        Self {
            fs_read: Some(Vec::new()),
            fs_write: Some(Vec::new()),
        }
    }

    /// Check if reading `path` is allowed
    pub fn can_read<P: AsRef<Path>>(&self, path: P) -> bool {
        check_path_permission(&self.fs_read, path.as_ref())
    }

    /// Check if writing `path` is allowed
    pub fn can_write<P: AsRef<Path>>(&self, path: P) -> bool {
        check_path_permission(&self.fs_write, path.as_ref())
    }

    /// Check read permission and return a Result
    pub fn require_read<P: AsRef<Path>>(&self, path: P) -> Result<(), PermissionDenied> {
        let path = path.as_ref();
        if self.can_read(path) {
            Ok(())
        } else {
            Err(PermissionDenied::new(
                "read",
                path.display().to_string(),
                "Use --allow-read to grant file system read access",
            ))
        }
    }

    /// Check write permission and return a Result
    pub fn require_write<P: AsRef<Path>>(&self, path: P) -> Result<(), PermissionDenied> {
        let path = path.as_ref();
        if self.can_write(path) {
            Ok(())
        } else {
            Err(PermissionDenied::new(
                "write",
                path.display().to_string(),
                "Use --allow-write to grant file system write access",
            ))
        }
    }
}

fn check_path_permission(allowlist: &Option<Vec<PathBuf>>, path: &Path) -> bool {
    match allowlist {
        None => false,
        Some(allowed) if allowed.is_empty() => true,
        Some(allowed) => {
            let path = resolve(path);
            allowed.iter().any(|root| path.starts_with(resolve(root)))
        }
    }
}

/// Canonical form of `path`; files that do not exist yet resolve through
/// their parent directory.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => dunce::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Builder for [`Capabilities`]
#[derive(Default)]
pub struct CapabilitiesBuilder {
    caps: Capabilities,
}

impl CapabilitiesBuilder {
    /// Start with everything denied
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow reading below specific paths
    pub fn allow_read(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.caps.fs_read = Some(paths.into_iter().collect());
        self
    }

    /// Allow reading everywhere
    pub fn allow_read_all(mut self) -> Self {
        self.caps.fs_read = Some(Vec::new());
        self
    }

    /// Allow writing below specific paths
    pub fn allow_write(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.caps.fs_write = Some(paths.into_iter().collect());
        self
    }

    /// Allow writing everywhere
    pub fn allow_write_all(mut self) -> Self {
        self.caps.fs_write = Some(Vec::new());
        self
    }

    /// Build the capabilities
    pub fn build(self) -> Capabilities {
        self.caps
    }
}

/// A capability check failed
#[derive(Debug, Clone, Error)]
#[error("PermissionDenied: {capability} access to '{resource}'. {message}")]
pub struct PermissionDenied {
    /// The denied capability ("read", "write")
    pub capability: String,
    /// The resource access was denied for
    pub resource: String,
    /// How to grant the permission
    pub message: String,
}

impl PermissionDenied {
    /// Create a new permission denied error
    pub fn new(
        capability: impl Into<String>,
        resource: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            capability: capability.into(),
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl From<PermissionDenied> for VmError {
    fn from(err: PermissionDenied) -> Self {
        VmError::PermissionDenied(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_denies_all() {
        let caps = Capabilities::default();
        assert!(!caps.can_read("/etc/passwd"));
        assert!(!caps.can_write("/tmp/test"));
        assert_eq!(caps, Capabilities::none());
    }

    #[test]
    fn test_all_allows_everything() {
        let caps = Capabilities::all();
        assert!(caps.can_read("/etc/passwd"));
        assert!(caps.can_write("/tmp/test"));
    }

    #[test]
    fn test_allow_specific_read_paths() {
        let dir = tempfile::tempdir().unwrap();
        let caps = CapabilitiesBuilder::new()
            .allow_read(vec![dir.path().to_path_buf()])
            .build();

        assert!(caps.can_read(dir.path()));
        assert!(caps.can_read(dir.path().join("movie.bin")));
        assert!(caps.can_read(dir.path().join("sub/movie.bin")));
        assert!(!caps.can_read("/etc/passwd"));
        assert!(!caps.can_write(dir.path().join("movie.bin")));
    }

    #[test]
    fn test_write_to_new_file_under_allowed_root() {
        let dir = tempfile::tempdir().unwrap();
        let caps = CapabilitiesBuilder::new()
            .allow_write(vec![dir.path().to_path_buf()])
            .build();
        assert!(caps.can_write(dir.path().join("not-yet-created.txt")));
    }

    #[test]
    fn test_require_maps_to_vm_error() {
        let err = Capabilities::none().require_read("/secret").unwrap_err();
        assert_eq!(err.capability, "read");
        assert!(err.to_string().contains("--allow-read"));
        let vm: VmError = err.into();
        assert!(matches!(vm, VmError::PermissionDenied(_)));
        assert_eq!(vm.error_id(), Some(2148));
    }
}
