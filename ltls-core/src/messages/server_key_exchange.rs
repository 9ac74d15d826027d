//! ServerKeyExchange message for ephemeral Diffie-Hellman
//! (RFC 5246 Section 7.4.3).
//!
//! ```text
//! struct {
//!     opaque dh_p<1..2^16-1>;
//!     opaque dh_g<1..2^16-1>;
//!     opaque dh_Ys<1..2^16-1>;
//! } ServerDHParams;
//!
//! struct {
//!     ServerDHParams params;
//!     digitally-signed struct { ... } signed_params;
//! } ServerKeyExchange;
//! ```
//!
//! From TLS 1.2 on, `digitally-signed` is prefixed by the
//! SignatureAndHashAlgorithm pair. The signature is carried but not
//! verified: the client does not authenticate the server.

use ltls_crypto::DhParameters;

use crate::codec::{Emitter, Reader};
use crate::error::{Error, Result};
use crate::protocol::{HandshakeType, ProtocolVersion};

/// SignatureAndHashAlgorithm (RFC 5246 Section 7.4.1.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureAndHashAlgorithm {
    /// HashAlgorithm code (e.g. 4 = sha256)
    pub hash: u8,
    /// SignatureAlgorithm code (1 = rsa, 2 = dsa)
    pub signature: u8,
}

/// ServerKeyExchange carrying DH parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeyExchange {
    /// Prime modulus
    pub dh_p: Vec<u8>,
    /// Generator
    pub dh_g: Vec<u8>,
    /// Server public value
    pub dh_ys: Vec<u8>,
    /// Signature algorithm (TLS 1.2 only)
    pub algorithm: Option<SignatureAndHashAlgorithm>,
    /// Signature over the randoms and params
    pub signature: Vec<u8>,
}

impl ServerKeyExchange {
    /// The DH group as provider parameters.
    pub fn parameters(&self) -> DhParameters {
        DhParameters {
            p: self.dh_p.clone(),
            g: self.dh_g.clone(),
        }
    }

    /// Append the handshake message (header included) to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        let msg = out.begin_handshake(HandshakeType::ServerKeyExchange);
        out.put_vector(2, &self.dh_p)?;
        out.put_vector(2, &self.dh_g)?;
        out.put_vector(2, &self.dh_ys)?;
        if let Some(algorithm) = self.algorithm {
            out.put_u8(algorithm.hash);
            out.put_u8(algorithm.signature);
        }
        out.put_vector(2, &self.signature)?;
        out.patch_length(msg)
    }

    /// Decode a ServerKeyExchange body for the negotiated version.
    pub fn decode(body: &[u8], version: ProtocolVersion) -> Result<Self> {
        let mut reader = Reader::new(body);

        let read_param = |reader: &mut Reader<'_>, name: &str| -> Result<Vec<u8>> {
            let value = reader.read_vec16()?;
            if value.is_empty() {
                return Err(Error::InvalidMessage(format!("empty DH {}", name)));
            }
            Ok(value.to_vec())
        };

        let dh_p = read_param(&mut reader, "p")?;
        let dh_g = read_param(&mut reader, "g")?;
        let dh_ys = read_param(&mut reader, "Ys")?;

        let algorithm = if version.uses_sha256_prf() {
            Some(SignatureAndHashAlgorithm {
                hash: reader.read_u8()?,
                signature: reader.read_u8()?,
            })
        } else {
            None
        };
        let signature = reader.read_vec16()?.to_vec();
        reader.expect_empty("ServerKeyExchange")?;

        Ok(Self {
            dh_p,
            dh_g,
            dh_ys,
            algorithm,
            signature,
        })
    }
}
