//! Byte cursor used by the record decoder

use crate::error::{BytecodeError, Result};

/// Little-endian cursor over a byte slice.
///
/// Offsets reported in errors are absolute: a sub-reader keeps the base
/// offset of its parent so that diagnostics point into the original tag.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Position relative to the start of this reader
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute position (including the parent's base offset)
    #[inline]
    pub fn absolute_position(&self) -> usize {
        self.base + self.pos
    }

    /// Bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True when every byte has been consumed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(BytecodeError::UnexpectedEnd {
                offset: self.absolute_position(),
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read one byte
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian `u16`
    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    /// Read a little-endian `i16`
    pub fn i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    /// Read a little-endian `u32`
    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Read a little-endian `i32`
    pub fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    /// Read a little-endian IEEE single
    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// Read an action-record double.
    ///
    /// Stored as two little-endian 32-bit words with the high word first.
    pub fn f64(&mut self) -> Result<f64> {
        let high = self.u32()? as u64;
        let low = self.u32()? as u64;
        Ok(f64::from_bits((high << 32) | low))
    }

    /// Read a NUL-terminated string. Invalid UTF-8 is replaced, not rejected.
    pub fn cstr(&mut self) -> Result<String> {
        let start = self.absolute_position();
        let rest = &self.data[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BytecodeError::UnterminatedString { offset: start })?;
        let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos += nul + 1;
        Ok(s)
    }

    /// Read `n` raw bytes
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Split off a reader over exactly the next `n` bytes
    pub fn sub_reader(&mut self, n: usize) -> Result<ByteReader<'a>> {
        let base = self.absolute_position();
        let data = self.take(n)?;
        Ok(ByteReader { data, pos: 0, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let mut r = ByteReader::new(&[0x34, 0x12, 0xFE, 0xFF, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.i16().unwrap(), -2);
        assert_eq!(r.u32().unwrap(), 0x1234_5678);
        assert!(r.is_empty());
    }

    #[test]
    fn test_swapped_double() {
        let bits = 1.5f64.to_bits();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&((bits >> 32) as u32).to_le_bytes());
        bytes.extend_from_slice(&(bits as u32).to_le_bytes());
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.f64().unwrap(), 1.5);
    }

    #[test]
    fn test_cstr() {
        let mut r = ByteReader::new(b"abc\0de\0");
        assert_eq!(r.cstr().unwrap(), "abc");
        assert_eq!(r.cstr().unwrap(), "de");
        assert!(matches!(
            ByteReader::new(b"abc").cstr(),
            Err(BytecodeError::UnterminatedString { offset: 0 })
        ));
    }

    #[test]
    fn test_sub_reader_keeps_absolute_offsets() {
        let data = [1u8, 2, 3, 4];
        let mut r = ByteReader::new(&data);
        r.u8().unwrap();
        let mut sub = r.sub_reader(2).unwrap();
        assert_eq!(sub.u8().unwrap(), 2);
        assert_eq!(sub.absolute_position(), 2);
        match sub.u16() {
            Err(BytecodeError::UnexpectedEnd {
                offset, available, ..
            }) => {
                assert_eq!(offset, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(r.remaining(), 1);
    }
}
