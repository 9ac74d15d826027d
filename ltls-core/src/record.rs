//! TLS record layer framing.
//!
//! # Record Structure (TLS 1.0-1.2)
//!
//! ```text
//! struct {
//!     ContentType type;
//!     ProtocolVersion version;
//!     uint16 length;
//!     opaque fragment[TLSPlaintext.length];
//! } TLSPlaintext;
//! ```
//!
//! Inbound bytes arrive in arbitrary chunks; [`RecordBuffer`] accumulates
//! them and yields one record at a time once the 5-byte header and the
//! declared payload are both available.

use bytes::{Buf, BytesMut};

use crate::codec::Emitter;
use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{ContentType, ProtocolVersion};

/// Maximum plaintext fragment size (2^14).
pub const MAX_FRAGMENT_SIZE: usize = 16384;

/// Maximum protected fragment size (2^14 + 2048).
pub const MAX_CIPHERTEXT_SIZE: usize = MAX_FRAGMENT_SIZE + 2048;

/// TLS record header size (5 bytes).
pub const RECORD_HEADER_SIZE: usize = 5;

/// A TLS record, plaintext or protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPlaintext {
    /// Content type
    pub content_type: ContentType,

    /// Record-layer version
    pub version: ProtocolVersion,

    /// Fragment data
    pub fragment: Vec<u8>,
}

impl TlsPlaintext {
    /// Create a new record.
    pub fn new(content_type: ContentType, version: ProtocolVersion, fragment: Vec<u8>) -> Self {
        Self {
            content_type,
            version,
            fragment,
        }
    }

    /// Get the record length (including header).
    pub fn len(&self) -> usize {
        RECORD_HEADER_SIZE + self.fragment.len()
    }

    /// Check if the fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty()
    }

    /// Append the encoded record to `out`.
    pub fn encode_into(&self, out: &mut Emitter) -> Result<()> {
        if self.fragment.len() > MAX_CIPHERTEXT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }
        let mark = out.begin_record(self.content_type, self.version.to_bytes());
        out.put_slice(&self.fragment);
        out.patch_length(mark)
    }

    /// Encode the record to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Emitter::with_capacity(self.len());
        self.encode_into(&mut out)?;
        Ok(out.into_vec())
    }

    /// Decode a single complete record from bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = RecordHeader::parse(data)?;
        if data.len() < RECORD_HEADER_SIZE + header.length {
            return Err(Error::InvalidMessage("Incomplete record".into()));
        }
        Ok(Self {
            content_type: header.content_type,
            version: header.version,
            fragment: data[RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + header.length].to_vec(),
        })
    }
}

/// Parsed 5-byte record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Content type
    pub content_type: ContentType,
    /// Record-layer version
    pub version: ProtocolVersion,
    /// Declared fragment length
    pub length: usize,
}

impl RecordHeader {
    /// Parse and validate the first five bytes of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::InvalidMessage("Record too short".into()));
        }

        let content_type = ContentType::from_u8(data[0]).ok_or_else(|| {
            Error::UnexpectedMessage(format!("Invalid content type: {}", data[0]))
        })?;

        let version_raw = u16::from_be_bytes([data[1], data[2]]);
        let version = ProtocolVersion::from_u16(version_raw)
            .ok_or(Error::UnsupportedVersion(version_raw))?;

        let length = u16::from_be_bytes([data[3], data[4]]) as usize;
        if length > MAX_CIPHERTEXT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }

        Ok(Self {
            content_type,
            version,
            length,
        })
    }
}

/// Accumulator for inbound transport bytes.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buf: BytesMut,
}

impl RecordBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the transport.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pop the next complete record, or `None` if more bytes are needed.
    ///
    /// A malformed header is reported as soon as its five bytes are
    /// available, without waiting for the payload.
    pub fn next_record(&mut self) -> Result<Option<TlsPlaintext>> {
        if self.buf.len() < RECORD_HEADER_SIZE {
            return Ok(None);
        }
        let header = RecordHeader::parse(&self.buf)?;
        if self.buf.len() < RECORD_HEADER_SIZE + header.length {
            return Ok(None);
        }

        self.buf.advance(RECORD_HEADER_SIZE);
        let fragment = self.buf.split_to(header.length).to_vec();
        Ok(Some(TlsPlaintext {
            content_type: header.content_type,
            version: header.version,
            fragment,
        }))
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
