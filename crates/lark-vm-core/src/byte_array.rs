//! Shared byte buffers
//!
//! A `ByteArray` may be attached to a domain as domain memory and then be
//! referenced by several workers at once. Storage is a slice of atomic
//! 32-bit words so that byte access and 32-bit compare-and-swap can share
//! the same memory without locks. Bytes are little-endian within a word.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{VmError, VmResult};

/// A fixed-length, thread-safe byte buffer
#[derive(Debug)]
pub struct ByteArray {
    words: Box<[AtomicU32]>,
    len: usize,
}

impl ByteArray {
    /// Create a zeroed buffer of `len` bytes
    pub fn new(len: usize) -> Self {
        let words: Vec<AtomicU32> = (0..len.div_ceil(4)).map(|_| AtomicU32::new(0)).collect();
        Self {
            words: words.into_boxed_slice(),
            len,
        }
    }

    /// Create a buffer holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let words: Vec<AtomicU32> = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                AtomicU32::new(u32::from_le_bytes(word))
            })
            .collect();
        Self {
            words: words.into_boxed_slice(),
            len: bytes.len(),
        }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length buffer
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read a byte
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        if index >= self.len {
            return None;
        }
        let word = self.words[index / 4].load(Ordering::SeqCst);
        Some((word >> ((index % 4) * 8)) as u8)
    }

    /// Write a byte. Returns false when out of range.
    pub fn set(&self, index: usize, value: u8) -> bool {
        if index >= self.len {
            return false;
        }
        let shift = (index % 4) * 8;
        let mask = !(0xFFu32 << shift);
        let _ = self.words[index / 4].fetch_update(Ordering::SeqCst, Ordering::SeqCst, |word| {
            Some((word & mask) | ((value as u32) << shift))
        });
        true
    }

    /// Copy bytes starting at `offset` into `dest`
    pub fn read_bytes(&self, offset: usize, dest: &mut [u8]) -> bool {
        if offset.checked_add(dest.len()).is_none_or(|end| end > self.len) {
            return false;
        }
        for (i, byte) in dest.iter_mut().enumerate() {
            *byte = self.get(offset + i).unwrap_or_default();
        }
        true
    }

    /// Copy `src` into the buffer starting at `offset`
    pub fn write_bytes(&self, offset: usize, src: &[u8]) -> bool {
        if offset.checked_add(src.len()).is_none_or(|end| end > self.len) {
            return false;
        }
        for (i, &byte) in src.iter().enumerate() {
            self.set(offset + i, byte);
        }
        true
    }

    /// Snapshot of the contents
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.len];
        self.read_bytes(0, &mut out);
        out
    }

    fn word(&self, addr: usize) -> VmResult<&AtomicU32> {
        if addr % 4 != 0 || addr.checked_add(4).is_none_or(|end| end > self.len) {
            return Err(VmError::range_error(format!(
                "address {addr} is not an aligned 32-bit slot in a {}-byte buffer",
                self.len
            )));
        }
        Ok(&self.words[addr / 4])
    }

    /// Read the 32-bit slot at `addr`
    pub fn read_i32(&self, addr: usize) -> VmResult<i32> {
        Ok(self.word(addr)?.load(Ordering::SeqCst) as i32)
    }

    /// Write the 32-bit slot at `addr`
    pub fn write_i32(&self, addr: usize, value: i32) -> VmResult<()> {
        self.word(addr)?.store(value as u32, Ordering::SeqCst);
        Ok(())
    }

    /// Atomically replace the slot at `addr` with `new` if it holds
    /// `expected`. Returns the value held before the operation.
    pub fn compare_and_swap_i32(&self, addr: usize, expected: i32, new: i32) -> VmResult<i32> {
        let word = self.word(addr)?;
        match word.compare_exchange(
            expected as u32,
            new as u32,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(old) | Err(old) => Ok(old as i32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_bytes_and_words_share_storage() {
        let buf = ByteArray::new(8);
        assert!(buf.set(0, 0x78));
        assert!(buf.set(1, 0x56));
        assert!(buf.set(2, 0x34));
        assert!(buf.set(3, 0x12));
        assert_eq!(buf.read_i32(0).unwrap(), 0x1234_5678);
        buf.write_i32(4, -1).unwrap();
        assert_eq!(buf.get(7), Some(0xFF));
        assert_eq!(buf.get(8), None);
        assert!(!buf.set(8, 1));
    }

    #[test]
    fn test_from_bytes_odd_length() {
        let buf = ByteArray::from_bytes(b"hello");
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.to_vec(), b"hello");
        assert!(buf.read_i32(4).is_err());
    }

    #[test]
    fn test_cas_alignment() {
        let buf = ByteArray::new(16);
        assert!(matches!(
            buf.compare_and_swap_i32(2, 0, 1),
            Err(VmError::RangeError(_))
        ));
        assert!(buf.compare_and_swap_i32(16, 0, 1).is_err());
        assert_eq!(buf.compare_and_swap_i32(12, 0, 7).unwrap(), 0);
        assert_eq!(buf.compare_and_swap_i32(12, 0, 9).unwrap(), 7);
        assert_eq!(buf.read_i32(12).unwrap(), 7);
    }

    #[test]
    fn test_concurrent_byte_writes_do_not_clobber_neighbours() {
        let buf = Arc::new(ByteArray::new(4));
        let barrier = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let buf = Arc::clone(&buf);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..1000 {
                        buf.set(i, i as u8 + 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(buf.to_vec(), vec![1, 2, 3, 4]);
    }
}
