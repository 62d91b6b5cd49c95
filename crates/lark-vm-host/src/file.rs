//! `avmplus.File`

use std::sync::Arc;

use lark_vm_core::{ByteArray, ObjectRef, ScriptObject, Value, VmError, VmResult};
use tracing::debug;

use crate::io::HostIo;
use crate::native::{Args, define_method};

/// File access as seen by script
#[derive(Clone)]
pub struct File {
    io: Arc<dyn HostIo>,
}

impl File {
    /// File surface over `io`
    pub fn new(io: Arc<dyn HostIo>) -> Self {
        Self { io }
    }

    /// `File.exists(path)`
    pub fn exists(&self, path: &str) -> bool {
        self.io.exists(path)
    }

    /// `File.read(path)`
    pub fn read(&self, path: &str) -> VmResult<String> {
        self.require_exists(path)?;
        self.io.read_text(path)
    }

    /// `File.write(path, text)`
    pub fn write(&self, path: &str, text: &str) -> VmResult<()> {
        self.io.write_text(path, text)
    }

    /// `File.readByteArray(path)`
    pub fn read_byte_array(&self, path: &str) -> VmResult<Arc<ByteArray>> {
        self.require_exists(path)?;
        let bytes = self.io.read_bytes(path)?;
        Ok(Arc::new(ByteArray::from_bytes(&bytes)))
    }

    /// `File.writeByteArray(path, bytes)`
    pub fn write_byte_array(&self, path: &str, bytes: &ByteArray) -> VmResult<()> {
        self.io.write_bytes(path, &bytes.to_vec())
    }

    fn require_exists(&self, path: &str) -> VmResult<()> {
        if self.io.exists(path) {
            Ok(())
        } else {
            debug!(path, "file does not exist");
            Err(VmError::FileOpen(path.to_string()))
        }
    }

    /// Script object with the `File` methods
    pub fn into_script_object(self) -> ObjectRef {
        let obj = ScriptObject::new("File", None);

        let file = self.clone();
        define_method(&obj, "exists", move |_, _, args| {
            let args = Args::new("exists", args).expect(1, 1)?;
            Ok(Value::Boolean(file.exists(&args.string(0))))
        });

        let file = self.clone();
        define_method(&obj, "read", move |_, _, args| {
            let args = Args::new("read", args).expect(1, 1)?;
            Ok(Value::string(file.read(&args.string(0))?))
        });

        let file = self.clone();
        define_method(&obj, "write", move |_, _, args| {
            let args = Args::new("write", args).expect(2, 2)?;
            file.write(&args.string(0), &args.string(1))?;
            Ok(Value::Undefined)
        });

        let file = self.clone();
        define_method(&obj, "readByteArray", move |_, _, args| {
            let args = Args::new("readByteArray", args).expect(1, 1)?;
            let bytes = file.read_byte_array(&args.string(0))?;
            Ok(Value::Object(ScriptObject::byte_array(bytes)))
        });

        let file = self;
        define_method(&obj, "writeByteArray", move |_, _, args| {
            let args = Args::new("writeByteArray", args).expect(2, 2)?;
            file.write_byte_array(&args.string(0), &*args.byte_array(1)?)?;
            Ok(Value::Undefined)
        });

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryHostIo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts reads that reach the underlying I/O
    #[derive(Default)]
    struct CountingIo {
        inner: MemoryHostIo,
        reads: AtomicUsize,
    }

    impl HostIo for CountingIo {
        fn exists(&self, path: &str) -> bool {
            self.inner.exists(path)
        }

        fn read_text(&self, path: &str) -> VmResult<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_text(path)
        }

        fn write_text(&self, path: &str, text: &str) -> VmResult<()> {
            self.inner.write_text(path, text)
        }

        fn read_bytes(&self, path: &str) -> VmResult<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_bytes(path)
        }

        fn write_bytes(&self, path: &str, bytes: &[u8]) -> VmResult<()> {
            self.inner.write_bytes(path, bytes)
        }
    }

    #[test]
    fn test_missing_file_fails_before_reading() {
        let io = Arc::new(CountingIo::default());
        let file = File::new(io.clone());

        let err = file.read("missing.txt").unwrap_err();
        assert!(matches!(err, VmError::FileOpen(ref p) if p == "missing.txt"));
        assert_eq!(err.error_id(), Some(1500));
        assert!(matches!(
            file.read_byte_array("missing.txt"),
            Err(VmError::FileOpen(_))
        ));
        assert_eq!(io.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_text_and_bytes() {
        let io = Arc::new(MemoryHostIo::new());
        let file = File::new(io.clone());
        file.write("notes.txt", "hi").unwrap();
        assert!(file.exists("notes.txt"));
        assert_eq!(file.read("notes.txt").unwrap(), "hi");

        file.write_byte_array("blob", &ByteArray::from_bytes(&[1, 2, 3]))
            .unwrap();
        assert_eq!(io.get("blob").unwrap(), vec![1, 2, 3]);
        assert_eq!(file.read_byte_array("blob").unwrap().to_vec(), vec![1, 2, 3]);
    }
}
