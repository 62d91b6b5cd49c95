//! Application domains
//!
//! Domains form a tree of code-loading scopes. Class lookup falls back to
//! the parent on a miss. A domain may own a [`ByteArray`] as its domain
//! memory; workers that share the domain share the buffer.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::byte_array::ByteArray;
use crate::error::{VmError, VmResult};
use crate::value::Value;

/// Minimum size of an attached domain memory buffer
pub const MIN_DOMAIN_MEMORY_LIMIT: usize = 1024;

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// A node in the domain tree
pub struct Domain {
    id: u64,
    parent: Option<Weak<Domain>>,
    classes: RwLock<FxHashMap<String, Value>>,
    memory: RwLock<Option<Arc<ByteArray>>>,
}

impl Domain {
    fn with_parent(parent: Option<Weak<Domain>>) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed),
            parent,
            classes: RwLock::new(FxHashMap::default()),
            memory: RwLock::new(None),
        })
    }

    /// Create a domain without a parent
    pub fn new_root() -> Arc<Self> {
        Self::with_parent(None)
    }

    /// Create a child that delegates lookups to `parent`
    pub fn new_child(parent: &Arc<Domain>) -> Arc<Self> {
        Self::with_parent(Some(Arc::downgrade(parent)))
    }

    /// Unique id, for logging
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Parent domain, if it is still alive
    pub fn parent(&self) -> Option<Arc<Domain>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Register a class definition in this domain
    pub fn define_class(&self, name: impl Into<String>, class: Value) {
        self.classes.write().insert(name.into(), class);
    }

    /// Find a class here or in an ancestor
    pub fn get_class(&self, name: &str) -> Option<Value> {
        if let Some(class) = self.classes.read().get(name) {
            return Some(class.clone());
        }
        let mut next = self.parent();
        while let Some(domain) = next {
            if let Some(class) = domain.classes.read().get(name) {
                return Some(class.clone());
            }
            next = domain.parent();
        }
        None
    }

    // ==================== Domain memory ====================

    /// Attached memory buffer
    pub fn domain_memory(&self) -> Option<Arc<ByteArray>> {
        self.memory.read().clone()
    }

    /// Attach or detach (`None`) the memory buffer.
    ///
    /// A buffer shorter than [`MIN_DOMAIN_MEMORY_LIMIT`] is rejected and the
    /// current buffer stays attached.
    pub fn set_domain_memory(&self, memory: Option<Arc<ByteArray>>) -> VmResult<()> {
        if let Some(buffer) = &memory
            && buffer.len() < MIN_DOMAIN_MEMORY_LIMIT
        {
            return Err(VmError::range_error(format!(
                "domain memory must be at least {MIN_DOMAIN_MEMORY_LIMIT} bytes, got {}",
                buffer.len()
            )));
        }
        debug!(
            domain = self.id,
            len = memory.as_ref().map(|m| m.len()),
            "domain memory attached"
        );
        *self.memory.write() = memory;
        Ok(())
    }

    /// Compare-and-swap on the attached memory.
    ///
    /// Yields 0 without touching anything when no memory is attached.
    pub fn compare_and_swap_i32(&self, addr: usize, expected: i32, new: i32) -> VmResult<i32> {
        match self.domain_memory() {
            Some(memory) => memory.compare_and_swap_i32(addr, expected, new),
            None => Ok(0),
        }
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("id", &self.id)
            .field("parent", &self.parent().map(|p| p.id))
            .field("memory", &self.memory.read().as_ref().map(|m| m.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_class_lookup_delegates_to_parent() {
        let root = Domain::new_root();
        let child = Domain::new_child(&root);
        root.define_class("Shape", Value::from("root shape"));
        assert_eq!(child.get_class("Shape"), Some(Value::from("root shape")));
        child.define_class("Shape", Value::from("child shape"));
        assert_eq!(child.get_class("Shape"), Some(Value::from("child shape")));
        assert_eq!(root.get_class("Shape"), Some(Value::from("root shape")));
        assert_eq!(child.get_class("Missing"), None);
    }

    #[test]
    fn test_short_memory_rejected_previous_kept() {
        let domain = Domain::new_root();
        let big = Arc::new(ByteArray::new(MIN_DOMAIN_MEMORY_LIMIT));
        domain.set_domain_memory(Some(big.clone())).unwrap();
        let err = domain
            .set_domain_memory(Some(Arc::new(ByteArray::new(10))))
            .unwrap_err();
        assert!(matches!(err, VmError::RangeError(_)));
        assert!(Arc::ptr_eq(&domain.domain_memory().unwrap(), &big));
        domain.set_domain_memory(None).unwrap();
        assert!(domain.domain_memory().is_none());
    }

    #[test]
    fn test_cas_without_memory_yields_zero() {
        let domain = Domain::new_root();
        assert_eq!(domain.compare_and_swap_i32(0, 5, 6).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_cas_exactly_one_wins() {
        let domain = Domain::new_root();
        domain
            .set_domain_memory(Some(Arc::new(ByteArray::new(MIN_DOMAIN_MEMORY_LIMIT))))
            .unwrap();
        for round in 0..50 {
            let addr = 64;
            let expected = round;
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = [1000 + round, 2000 + round]
                .into_iter()
                .map(|replacement| {
                    let domain = Arc::clone(&domain);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        let previous = domain
                            .compare_and_swap_i32(addr, expected, replacement)
                            .unwrap();
                        (previous, replacement)
                    })
                })
                .collect();
            let results: Vec<(i32, i32)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let winners: Vec<_> = results.iter().filter(|(prev, _)| *prev == expected).collect();
            assert_eq!(winners.len(), 1);
            let winner_value = winners[0].1;
            let loser = results.iter().find(|(prev, _)| *prev != expected).unwrap();
            assert_eq!(loser.0, winner_value);
            // Reset the slot for the next round
            let memory = domain.domain_memory().unwrap();
            memory.write_i32(addr, round + 1).unwrap();
        }
    }
}
