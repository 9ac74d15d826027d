//! ClientKeyExchange message (RFC 5246 Section 7.4.7).
//!
//! Both supported key exchanges send a single `u16`-prefixed opaque value:
//!
//! ```text
//! RSA:  opaque encrypted_pre_master_secret<0..2^16-1>;  -- PKCS#1 v1.5
//! DHE:  opaque dh_Yc<1..2^16-1>;                         -- explicit
//! ```
//!
//! TLS 1.0 allows the RSA ciphertext without a length prefix; it is
//! always sent with one here, as every deployed stack does.

use crate::codec::{Emitter, Reader};
use crate::error::{Error, Result};
use crate::protocol::HandshakeType;

/// ClientKeyExchange message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeyExchange {
    /// Encrypted pre-master secret or client DH public value
    pub exchange_keys: Vec<u8>,
}

impl ClientKeyExchange {
    /// Create a ClientKeyExchange message.
    pub fn new(exchange_keys: Vec<u8>) -> Self {
        Self { exchange_keys }
    }

    /// Append the handshake message (header included) to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        let msg = out.begin_handshake(HandshakeType::ClientKeyExchange);
        out.put_vector(2, &self.exchange_keys)?;
        out.patch_length(msg)
    }

    /// Decode a ClientKeyExchange body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(body);
        let exchange_keys = reader.read_vec16()?.to_vec();
        reader.expect_empty("ClientKeyExchange")?;
        if exchange_keys.is_empty() {
            return Err(Error::InvalidMessage("empty ClientKeyExchange".into()));
        }
        Ok(Self { exchange_keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key_exchange() {
        let cke = ClientKeyExchange::new(vec![0xC3; 128]);
        let mut out = Emitter::new();
        cke.encode(&mut out).unwrap();
        let bytes = out.into_vec();

        assert_eq!(&bytes[..6], &[16, 0, 0, 130, 0, 128]);
        assert_eq!(ClientKeyExchange::decode(&bytes[4..]).unwrap(), cke);
    }

    #[test]
    fn test_client_key_exchange_malformed() {
        assert!(ClientKeyExchange::decode(&[0, 0]).is_err());
        assert!(ClientKeyExchange::decode(&[0, 2, 1]).is_err());
        assert!(ClientKeyExchange::decode(&[0, 1, 1, 9]).is_err());
    }
}
