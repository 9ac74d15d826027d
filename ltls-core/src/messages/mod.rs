//! TLS 1.0-1.2 handshake messages.
//!
//! ```text
//! struct {
//!     HandshakeType msg_type;    -- 1 byte
//!     uint24 length;             -- 3 bytes
//!     body[length];
//! } Handshake;
//! ```
//!
//! Every message type encodes itself, header included, into an
//! [`Emitter`] and decodes from its body. [`HandshakeBuffer`] reassembles
//! messages that span records and splits records carrying several.

pub mod certificate;
pub mod client_hello;
pub mod client_key_exchange;
pub mod finished;
pub mod server_hello;
pub mod server_hello_done;
pub mod server_key_exchange;

pub use certificate::Certificate;
pub use client_hello::ClientHello;
pub use client_key_exchange::ClientKeyExchange;
pub use finished::Finished;
pub use server_hello::ServerHello;
pub use server_hello_done::ServerHelloDone;
pub use server_key_exchange::{ServerKeyExchange, SignatureAndHashAlgorithm};

use bytes::BytesMut;

use crate::codec::Emitter;
use crate::error::{Error, Result};
use crate::protocol::{HandshakeType, ProtocolVersion};

/// Handshake message header size.
pub const HANDSHAKE_HEADER_SIZE: usize = 4;

/// Largest handshake body accepted (certificate chains included).
pub const MAX_HANDSHAKE_SIZE: usize = 1 << 16;

/// Any handshake message the engine understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeMessage {
    /// ClientHello
    ClientHello(ClientHello),
    /// ServerHello
    ServerHello(ServerHello),
    /// Certificate
    Certificate(Certificate),
    /// ServerKeyExchange
    ServerKeyExchange(ServerKeyExchange),
    /// ServerHelloDone
    ServerHelloDone(ServerHelloDone),
    /// ClientKeyExchange
    ClientKeyExchange(ClientKeyExchange),
    /// Finished
    Finished(Finished),
}

impl HandshakeMessage {
    /// Wire type of this message.
    pub fn handshake_type(&self) -> HandshakeType {
        match self {
            HandshakeMessage::ClientHello(_) => HandshakeType::ClientHello,
            HandshakeMessage::ServerHello(_) => HandshakeType::ServerHello,
            HandshakeMessage::Certificate(_) => HandshakeType::Certificate,
            HandshakeMessage::ServerKeyExchange(_) => HandshakeType::ServerKeyExchange,
            HandshakeMessage::ServerHelloDone(_) => HandshakeType::ServerHelloDone,
            HandshakeMessage::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            HandshakeMessage::Finished(_) => HandshakeType::Finished,
        }
    }

    /// Decode a message body.
    ///
    /// `version` is only consulted for ServerKeyExchange, whose layout
    /// changes at TLS 1.2.
    pub fn decode(msg_type: HandshakeType, body: &[u8], version: ProtocolVersion) -> Result<Self> {
        Ok(match msg_type {
            HandshakeType::ClientHello => Self::ClientHello(ClientHello::decode(body)?),
            HandshakeType::ServerHello => Self::ServerHello(ServerHello::decode(body)?),
            HandshakeType::Certificate => Self::Certificate(Certificate::decode(body)?),
            HandshakeType::ServerKeyExchange => {
                Self::ServerKeyExchange(ServerKeyExchange::decode(body, version)?)
            },
            HandshakeType::ServerHelloDone => Self::ServerHelloDone(ServerHelloDone::decode(body)?),
            HandshakeType::ClientKeyExchange => {
                Self::ClientKeyExchange(ClientKeyExchange::decode(body)?)
            },
            HandshakeType::Finished => Self::Finished(Finished::decode(body)?),
        })
    }

    /// Append the encoded message (header included) to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        match self {
            HandshakeMessage::ClientHello(m) => m.encode(out),
            HandshakeMessage::ServerHello(m) => m.encode(out),
            HandshakeMessage::Certificate(m) => m.encode(out),
            HandshakeMessage::ServerKeyExchange(m) => m.encode(out),
            HandshakeMessage::ServerHelloDone(m) => m.encode(out),
            HandshakeMessage::ClientKeyExchange(m) => m.encode(out),
            HandshakeMessage::Finished(m) => m.encode(out),
        }
    }

    /// Encode to a standalone byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Emitter::new();
        self.encode(&mut out)?;
        Ok(out.into_vec())
    }
}

/// A complete handshake message split off the handshake stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHandshake {
    /// Message type
    pub msg_type: HandshakeType,
    /// Header and body, exactly as received (transcript input)
    pub raw: Vec<u8>,
}

impl RawHandshake {
    /// Message body without the 4-byte header.
    pub fn body(&self) -> &[u8] {
        &self.raw[HANDSHAKE_HEADER_SIZE..]
    }
}

/// Reassembly buffer for the handshake content stream.
#[derive(Debug, Default)]
pub struct HandshakeBuffer {
    buf: BytesMut,
}

impl HandshakeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handshake record fragment.
    pub fn extend(&mut self, fragment: &[u8]) {
        self.buf.extend_from_slice(fragment);
    }

    /// True if no partial message is pending.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete message, or `None` if more bytes are needed.
    pub fn next_message(&mut self) -> Result<Option<RawHandshake>> {
        if self.buf.len() < HANDSHAKE_HEADER_SIZE {
            return Ok(None);
        }

        let msg_type = HandshakeType::from_u8(self.buf[0]).ok_or_else(|| {
            Error::UnexpectedMessage(format!("unknown handshake type {}", self.buf[0]))
        })?;
        let length = u32::from_be_bytes([0, self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if length > MAX_HANDSHAKE_SIZE {
            return Err(Error::InvalidMessage(format!(
                "handshake message of {} bytes exceeds limit",
                length
            )));
        }
        if self.buf.len() < HANDSHAKE_HEADER_SIZE + length {
            return Ok(None);
        }

        let raw = self.buf.split_to(HANDSHAKE_HEADER_SIZE + length).to_vec();
        Ok(Some(RawHandshake { msg_type, raw }))
    }

    /// Drop buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
