//! ClientHello message (RFC 5246 Section 7.4.1.2).
//!
//! ```text
//! struct {
//!     ProtocolVersion client_version;
//!     Random random;
//!     SessionID session_id;                         -- <0..32>
//!     CipherSuite cipher_suites<2..2^16-2>;
//!     CompressionMethod compression_methods<1..2^8-1>;
//!     select (extensions_present) {
//!         case false: struct {};
//!         case true:  Extension extensions<0..2^16-1>;
//!     };
//! } ClientHello;
//! ```

use crate::codec::{Emitter, Reader};
use crate::error::{Error, Result};
use crate::extensions::{decode_extensions, encode_extensions, Extension};
use crate::protocol::{HandshakeType, ProtocolVersion, RANDOM_SIZE};

/// The only compression method offered.
pub const COMPRESSION_NULL: u8 = 0;

/// ClientHello message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    /// Highest version the client supports
    pub client_version: ProtocolVersion,
    /// Client random
    pub random: [u8; RANDOM_SIZE],
    /// Session id (always empty; no resumption)
    pub session_id: Vec<u8>,
    /// Offered cipher suite ids, in preference order
    pub cipher_suites: Vec<u16>,
    /// Offered compression methods
    pub compression_methods: Vec<u8>,
    /// Hello extensions
    pub extensions: Vec<Extension>,
}

impl ClientHello {
    /// Create a ClientHello with an empty session id and null compression.
    pub fn new(
        client_version: ProtocolVersion,
        random: [u8; RANDOM_SIZE],
        cipher_suites: Vec<u16>,
    ) -> Self {
        Self {
            client_version,
            random,
            session_id: Vec::new(),
            cipher_suites,
            compression_methods: vec![COMPRESSION_NULL],
            extensions: Vec::new(),
        }
    }

    /// Add the `server_name` extension.
    pub fn with_server_name(mut self, host: &str) -> Result<Self> {
        self.extensions.push(Extension::server_name(host)?);
        Ok(self)
    }

    /// The host name requested through SNI, if any.
    pub fn server_name(&self) -> Option<String> {
        self.extensions
            .iter()
            .find_map(|ext| ext.parse_server_name().ok().flatten())
    }

    /// Append the handshake message (header included) to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        if self.cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("no cipher suites to offer".into()));
        }

        let msg = out.begin_handshake(HandshakeType::ClientHello);
        out.put_slice(&self.client_version.to_bytes());
        out.put_slice(&self.random);
        out.put_vector(1, &self.session_id)?;

        let suites = out.reserve(2);
        for id in &self.cipher_suites {
            out.put_u16(*id);
        }
        out.patch_length(suites)?;

        out.put_vector(1, &self.compression_methods)?;
        encode_extensions(out, &self.extensions)?;
        out.patch_length(msg)
    }

    /// Decode a ClientHello body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(body);

        let raw_version = reader.read_u16()?;
        let client_version = ProtocolVersion::from_u16(raw_version)
            .ok_or(Error::UnsupportedVersion(raw_version))?;
        let random = reader.read_array::<RANDOM_SIZE>()?;

        let session_id = reader.read_vec8()?;
        if session_id.len() > 32 {
            return Err(Error::InvalidMessage("session id longer than 32 bytes".into()));
        }

        let suite_bytes = reader.read_vec16()?;
        if suite_bytes.is_empty() || suite_bytes.len() % 2 != 0 {
            return Err(Error::InvalidMessage("malformed cipher suite list".into()));
        }
        let cipher_suites = suite_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        let compression_methods = reader.read_vec8()?.to_vec();
        if compression_methods.is_empty() {
            return Err(Error::InvalidMessage("no compression methods".into()));
        }

        let extensions = decode_extensions(&mut reader)?;
        reader.expect_empty("ClientHello")?;

        Ok(Self {
            client_version,
            random,
            session_id: session_id.to_vec(),
            cipher_suites,
            compression_methods,
            extensions,
        })
    }
}
