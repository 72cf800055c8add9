//! Growable byte writer and bounds-checked reader with big-endian framing
//!
//! The splitter uses [`ByteWriter`] to accumulate one buffer per fragment and
//! the recombiner uses it to assemble codewords and the reconstructed output.
//! Integers are written big-endian; arrays and strings carry a `u32` length
//! prefix.

use crate::error::CodingError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Default initial capacity for a writer
const DEFAULT_CAPACITY: usize = 64;

/// Append-only byte buffer
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    /// Create a writer with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a writer with room for `capacity` bytes before growing
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Spare capacity before the next reallocation
    pub fn free(&self) -> usize {
        self.buf.capacity() - self.buf.len()
    }

    /// Make sure at least `additional` more bytes fit without growing
    pub fn ensure_free(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }

    /// Discard the contents, keeping the allocation
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Write a single byte
    pub fn write_u8(&mut self, b: u8) {
        self.buf.put_u8(b);
    }

    /// Write a big-endian `u32`
    pub fn write_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    /// Write a big-endian `f64`
    pub fn write_f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    /// Write a `u32` length prefix followed by the bytes
    pub fn write_array(&mut self, data: &[u8]) {
        self.buf.reserve(data.len() + 4);
        self.buf.put_u32(data.len() as u32);
        self.buf.put_slice(data);
    }

    /// Write a UTF-8 string as a length-prefixed array
    pub fn write_str(&mut self, s: &str) {
        self.write_array(s.as_bytes());
    }

    /// Write raw bytes with no prefix
    pub fn write(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Current contents without consuming the writer
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Mutable view of the written bytes, for in-place correction
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Freeze the contents into an immutable buffer
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Sequential reader over an immutable buffer
#[derive(Debug, Clone)]
pub struct ByteReader {
    buf: Bytes,
}

impl ByteReader {
    /// Wrap a buffer
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, n: usize) -> Result<(), CodingError> {
        if self.buf.remaining() < n {
            return Err(CodingError::Truncated {
                expected: n,
                actual: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, CodingError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    /// Read a big-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32, CodingError> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    /// Read a big-endian `f64`
    pub fn read_f64(&mut self) -> Result<f64, CodingError> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    /// Read exactly `len` bytes without copying
    pub fn read(&mut self, len: usize) -> Result<Bytes, CodingError> {
        self.need(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Read a `u32` length prefix and that many bytes
    pub fn read_array(&mut self) -> Result<Bytes, CodingError> {
        let len = self.read_u32()? as usize;
        self.read(len)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String, CodingError> {
        let raw = self.read_array()?;
        String::from_utf8(Vec::from(&raw[..]))
            .map_err(|e| CodingError::InvalidMessage(e.to_string()))
    }

    /// Everything not yet read
    pub fn into_remaining(self) -> Bytes {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_big_endian() {
        let mut w = ByteWriter::new();
        w.write_u8(0xAB);
        w.write_u32(0x0102_0304);
        assert_eq!(w.as_slice(), &[0xAB, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_framed_fields_read_back_in_order() {
        let mut w = ByteWriter::with_capacity(4);
        w.write_array(b"frag");
        w.write_str("shard-7");
        w.write_f64(1.5);
        w.write(&[9, 9]);

        let mut r = ByteReader::new(w.into_bytes());
        assert_eq!(&r.read_array().unwrap()[..], b"frag");
        assert_eq!(r.read_string().unwrap(), "shard-7");
        assert_eq!(r.read_f64().unwrap(), 1.5);
        assert_eq!(&r.read(2).unwrap()[..], &[9, 9]);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut w = ByteWriter::with_capacity(128);
        w.write(&[1u8; 100]);
        w.reset();
        assert!(w.is_empty());
        assert!(w.free() >= 100);
    }

    #[test]
    fn test_ensure_free_grows() {
        let mut w = ByteWriter::with_capacity(1);
        w.ensure_free(1000);
        assert!(w.free() >= 1000);
    }

    #[test]
    fn test_read_past_end() {
        let mut r = ByteReader::new(Bytes::from_static(&[0, 0, 0, 9, 1, 2]));
        let err = r.read_array().unwrap_err();
        assert_eq!(
            err,
            CodingError::Truncated {
                expected: 9,
                actual: 2
            }
        );
    }
}
