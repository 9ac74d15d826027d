//! Wire encoding primitives.
//!
//! TLS nests length-prefixed structures several levels deep (record →
//! handshake message → vector → extension → ...). The [`Emitter`] writes
//! a zero placeholder for each length with [`Emitter::reserve`], keeps the
//! returned [`Mark`], and fills the real length in with
//! [`Emitter::patch_length`] once the enclosed bytes have been written:
//!
//! ```text
//!  reserve(3) ──► 00 00 00 | body ... | ◄── patch_length(mark)
//!                 └ mark.offset        └ buf.len()
//! ```
//!
//! The [`Reader`] is the bounds-checked counterpart used by every parser.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::{ContentType, HandshakeType};

/// Position and width of a reserved length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a reserved length must be patched"]
pub struct Mark {
    offset: usize,
    width: usize,
}

impl Mark {
    /// Byte offset of the placeholder in the emitter buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Width of the length field in bytes (1 to 3).
    pub fn width(&self) -> usize {
        self.width
    }
}

/// Growable output buffer with mark-then-patch length fields.
#[derive(Debug, Default, Clone)]
pub struct Emitter {
    buf: BytesMut,
}

impl Emitter {
    /// Create an empty emitter.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Create an emitter with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write one byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Write a big-endian u16.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Write a big-endian 24-bit integer.
    pub fn put_u24(&mut self, value: u32) {
        self.buf.put_uint(u64::from(value & 0x00FF_FFFF), 3);
    }

    /// Write raw bytes.
    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Write a zero placeholder of `width` bytes for a length to be patched.
    pub fn reserve(&mut self, width: usize) -> Mark {
        debug_assert!((1..=3).contains(&width));
        let offset = self.buf.len();
        self.buf.put_bytes(0, width);
        Mark { offset, width }
    }

    /// Overwrite the placeholder at `mark` with the number of bytes
    /// written after it.
    pub fn patch_length(&mut self, mark: Mark) -> Result<()> {
        let start = mark.offset + mark.width;
        if start > self.buf.len() {
            return Err(Error::InternalError("length mark beyond buffer".into()));
        }
        let length = self.buf.len() - start;
        let max = (1usize << (8 * mark.width)) - 1;
        if length > max {
            return Err(Error::InvalidMessage(format!(
                "{} bytes do not fit a {}-byte length",
                length, mark.width
            )));
        }

        let bytes = (length as u32).to_be_bytes();
        self.buf[mark.offset..start].copy_from_slice(&bytes[4 - mark.width..]);
        Ok(())
    }

    /// Start a record: content type, version, reserved 2-byte length.
    pub fn begin_record(&mut self, content_type: ContentType, version: [u8; 2]) -> Mark {
        self.put_u8(content_type.to_u8());
        self.put_slice(&version);
        self.reserve(2)
    }

    /// Start a handshake message: type, reserved 3-byte length.
    pub fn begin_handshake(&mut self, handshake_type: HandshakeType) -> Mark {
        self.put_u8(handshake_type.to_u8());
        self.reserve(3)
    }

    /// Write `data` behind a length prefix of `width` bytes.
    pub fn put_vector(&mut self, width: usize, data: &[u8]) -> Result<()> {
        let mark = self.reserve(width);
        self.put_slice(data);
        self.patch_length(mark)
    }

    /// View the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Finish and return the bytes as a vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

/// Bounds-checked big-endian reader over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset from the start.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consume exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::InvalidMessage(format!(
                "truncated: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Consume a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian 24-bit integer.
    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Read a vector with a 1-byte length prefix.
    pub fn read_vec8(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u8()? as usize;
        self.read_bytes(len)
    }

    /// Read a vector with a 2-byte length prefix.
    pub fn read_vec16(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u16()? as usize;
        self.read_bytes(len)
    }

    /// Read a vector with a 3-byte length prefix.
    pub fn read_vec24(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u24()? as usize;
        self.read_bytes(len)
    }

    /// Consume everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    /// Fail if any bytes are left over.
    pub fn expect_empty(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidMessage(format!(
                "{} has {} trailing bytes",
                what,
                self.remaining()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_patch() {
        let mut out = Emitter::new();
        let mark = out.reserve(2);
        out.put_slice(b"hello");
        out.patch_length(mark).unwrap();
        assert_eq!(out.as_slice(), &[0x00, 0x05, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_nested_marks() {
        let mut out = Emitter::new();
        let record = out.begin_record(ContentType::Handshake, [3, 1]);
        let handshake = out.begin_handshake(HandshakeType::ServerHelloDone);
        out.patch_length(handshake).unwrap();
        out.patch_length(record).unwrap();
        assert_eq!(out.as_slice(), &[22, 3, 1, 0, 4, 14, 0, 0, 0]);

        let mut out = Emitter::new();
        let outer = out.reserve(3);
        let inner = out.reserve(1);
        out.put_slice(&[0xAA; 3]);
        out.patch_length(inner).unwrap();
        out.put_u16(0xBEEF);
        out.patch_length(outer).unwrap();
        assert_eq!(
            out.as_slice(),
            &[0, 0, 6, 3, 0xAA, 0xAA, 0xAA, 0xBE, 0xEF]
        );
    }

    #[test]
    fn test_patch_overflow() {
        let mut out = Emitter::new();
        let mark = out.reserve(1);
        out.put_slice(&[0u8; 256]);
        assert!(out.patch_length(mark).is_err());
    }

    #[test]
    fn test_put_u24() {
        let mut out = Emitter::new();
        out.put_u24(0x012345);
        assert_eq!(out.as_slice(), &[0x01, 0x23, 0x45]);
    }

    #[test]
    fn test_reader_primitives() {
        let data = [0x01, 0x02, 0x03, 0x00, 0x00, 0x02, 0xAB, 0xCD, 0x02, 0x11, 0x22];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16().unwrap(), 0x0203);
        assert_eq!(r.read_vec24().unwrap(), &[0xAB, 0xCD]);
        assert_eq!(r.read_vec8().unwrap(), &[0x11, 0x22]);
        assert!(r.is_empty());
        assert!(r.expect_empty("test").is_ok());
    }

    #[test]
    fn test_reader_truncation() {
        let data = [0x00, 0x05, 0x01];
        let mut r = Reader::new(&data);
        assert!(r.read_vec16().is_err());

        let mut r = Reader::new(&[0x01]);
        assert!(r.read_u16().is_err());
        assert!(r.read_array::<4>().is_err());
    }
}
