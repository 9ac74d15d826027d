//! ServerHello message (RFC 5246 Section 7.4.1.3).
//!
//! ```text
//! struct {
//!     ProtocolVersion server_version;
//!     Random random;
//!     SessionID session_id;
//!     CipherSuite cipher_suite;
//!     CompressionMethod compression_method;
//!     select (extensions_present) {
//!         case false: struct {};
//!         case true:  Extension extensions<0..2^16-1>;
//!     };
//! } ServerHello;
//! ```
//!
//! The version is kept as the raw wire value so the handshake can report
//! an out-of-range version precisely.

use crate::codec::{Emitter, Reader};
use crate::error::{Error, Result};
use crate::extensions::{decode_extensions, encode_extensions, Extension};
use crate::protocol::{HandshakeType, RANDOM_SIZE};

/// ServerHello message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Version chosen by the server (raw wire value)
    pub server_version: u16,
    /// Server random
    pub random: [u8; RANDOM_SIZE],
    /// Session id assigned by the server
    pub session_id: Vec<u8>,
    /// Chosen cipher suite id
    pub cipher_suite: u16,
    /// Chosen compression method
    pub compression_method: u8,
    /// Hello extensions (ignored by the client)
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    /// Create a ServerHello with null compression and no extensions.
    pub fn new(
        server_version: u16,
        random: [u8; RANDOM_SIZE],
        session_id: Vec<u8>,
        cipher_suite: u16,
    ) -> Self {
        Self {
            server_version,
            random,
            session_id,
            cipher_suite,
            compression_method: 0,
            extensions: Vec::new(),
        }
    }

    /// Append the handshake message (header included) to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        let msg = out.begin_handshake(HandshakeType::ServerHello);
        out.put_u16(self.server_version);
        out.put_slice(&self.random);
        out.put_vector(1, &self.session_id)?;
        out.put_u16(self.cipher_suite);
        out.put_u8(self.compression_method);
        encode_extensions(out, &self.extensions)?;
        out.patch_length(msg)
    }

    /// Decode a ServerHello body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(body);

        let server_version = reader.read_u16()?;
        let random = reader.read_array::<RANDOM_SIZE>()?;
        let session_id = reader.read_vec8()?;
        if session_id.len() > 32 {
            return Err(Error::InvalidMessage("session id longer than 32 bytes".into()));
        }
        let cipher_suite = reader.read_u16()?;
        let compression_method = reader.read_u8()?;
        let extensions = decode_extensions(&mut reader)?;
        reader.expect_empty("ServerHello")?;

        Ok(Self {
            server_version,
            random,
            session_id: session_id.to_vec(),
            cipher_suite,
            compression_method,
            extensions,
        })
    }
}
