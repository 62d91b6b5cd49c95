//! Host I/O capability
//!
//! Everything the `File` and `Domain` surfaces read or write goes through a
//! [`HostIo`] injected by the embedder.

use std::io::ErrorKind;
use std::path::Path;

use lark_vm_core::{VmError, VmResult};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::capabilities::Capabilities;

/// File access used by the host surface
pub trait HostIo: Send + Sync {
    /// True if `path` names a readable file
    fn exists(&self, path: &str) -> bool;

    /// Read a file as UTF-8 text
    fn read_text(&self, path: &str) -> VmResult<String>;

    /// Create or replace a file with `text`
    fn write_text(&self, path: &str, text: &str) -> VmResult<()>;

    /// Read a file's bytes
    fn read_bytes(&self, path: &str) -> VmResult<Vec<u8>>;

    /// Create or replace a file with `bytes`
    fn write_bytes(&self, path: &str, bytes: &[u8]) -> VmResult<()>;
}

fn io_error(path: &str, err: std::io::Error) -> VmError {
    match err.kind() {
        ErrorKind::NotFound => VmError::FileOpen(path.to_string()),
        _ => VmError::Io(format!("{path}: {err}")),
    }
}

/// [`HostIo`] over `std::fs`, gated by [`Capabilities`]
#[derive(Debug, Clone, Default)]
pub struct FsHostIo {
    caps: Capabilities,
}

impl FsHostIo {
    /// File system access limited to `caps`
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    /// Granted capabilities
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }
}

impl HostIo for FsHostIo {
    fn exists(&self, path: &str) -> bool {
        if !self.caps.can_read(path) {
            debug!(path, "existence check without read permission");
            return false;
        }
        Path::new(path).is_file()
    }

    fn read_text(&self, path: &str) -> VmResult<String> {
        self.caps.require_read(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        debug!(path, len = text.len(), "read text");
        Ok(text)
    }

    fn write_text(&self, path: &str, text: &str) -> VmResult<()> {
        self.write_bytes(path, text.as_bytes())
    }

    fn read_bytes(&self, path: &str) -> VmResult<Vec<u8>> {
        self.caps.require_read(path)?;
        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        debug!(path, len = bytes.len(), "read bytes");
        Ok(bytes)
    }

    fn write_bytes(&self, path: &str, bytes: &[u8]) -> VmResult<()> {
        self.caps.require_write(path)?;
        std::fs::write(path, bytes).map_err(|e| io_error(path, e))?;
        debug!(path, len = bytes.len(), "wrote file");
        Ok(())
    }
}

/// In-memory [`HostIo`]
#[derive(Debug, Default)]
pub struct MemoryHostIo {
    files: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryHostIo {
    /// Empty file set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files.write().insert(path.to_string(), contents.into());
    }

    /// Current contents of a file
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(path).cloned()
    }
}

impl HostIo for MemoryHostIo {
    fn exists(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    fn read_text(&self, path: &str) -> VmResult<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes).map_err(|e| VmError::Io(format!("{path}: {e}")))
    }

    fn write_text(&self, path: &str, text: &str) -> VmResult<()> {
        self.write_bytes(path, text.as_bytes())
    }

    fn read_bytes(&self, path: &str) -> VmResult<Vec<u8>> {
        self.get(path)
            .ok_or_else(|| VmError::FileOpen(path.to_string()))
    }

    fn write_bytes(&self, path: &str, bytes: &[u8]) -> VmResult<()> {
        self.insert(path, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitiesBuilder;

    #[test]
    fn test_fs_round_trip_within_grant() {
        let dir = tempfile::tempdir().unwrap();
        let io = FsHostIo::new(
            CapabilitiesBuilder::new()
                .allow_read(vec![dir.path().to_path_buf()])
                .allow_write(vec![dir.path().to_path_buf()])
                .build(),
        );
        let path = dir.path().join("save.txt");
        let path = path.to_str().unwrap();
        assert!(!io.exists(path));
        io.write_text(path, "level=3").unwrap();
        assert!(io.exists(path));
        assert_eq!(io.read_text(path).unwrap(), "level=3");
        assert_eq!(io.read_bytes(path).unwrap(), b"level=3");
    }

    #[test]
    fn test_fs_denied_without_grant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, "x").unwrap();
        let path = path.to_str().unwrap();

        let io = FsHostIo::default();
        assert!(!io.exists(path));
        assert!(matches!(io.read_text(path), Err(VmError::PermissionDenied(_))));
        assert!(matches!(io.write_bytes(path, b"y"), Err(VmError::PermissionDenied(_))));
    }

    #[test]
    fn test_fs_missing_file_is_file_open() {
        let dir = tempfile::tempdir().unwrap();
        let io = FsHostIo::new(Capabilities::all());
        let path = dir.path().join("missing.bin");
        let err = io.read_bytes(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, VmError::FileOpen(_)));
    }

    #[test]
    fn test_memory_io() {
        let io = MemoryHostIo::new().with_file("a.txt", "hello");
        assert!(io.exists("a.txt"));
        assert_eq!(io.read_text("a.txt").unwrap(), "hello");
        io.write_bytes("b.bin", &[0xFF, 0xFE]).unwrap();
        assert_eq!(io.get("b.bin").unwrap(), vec![0xFF, 0xFE]);
        assert!(matches!(io.read_text("b.bin"), Err(VmError::Io(_))));
        assert!(matches!(io.read_bytes("c"), Err(VmError::FileOpen(_))));
    }
}
