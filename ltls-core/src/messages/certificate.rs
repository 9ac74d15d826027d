//! Certificate message (RFC 5246 Section 7.4.2).
//!
//! ```text
//! opaque ASN.1Cert<1..2^24-1>;
//!
//! struct {
//!     ASN.1Cert certificate_list<0..2^24-1>;
//! } Certificate;
//! ```

use crate::codec::{Emitter, Reader};
use crate::error::Result;
use crate::protocol::HandshakeType;

/// Certificate message: DER certificates, leaf first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Certificate {
    /// DER-encoded certificates
    pub certificate_list: Vec<Vec<u8>>,
}

impl Certificate {
    /// Create a Certificate message.
    pub fn new(certificate_list: Vec<Vec<u8>>) -> Self {
        Self { certificate_list }
    }

    /// Leaf certificate, if any.
    pub fn leaf(&self) -> Option<&[u8]> {
        self.certificate_list.first().map(Vec::as_slice)
    }

    /// Append the handshake message (header included) to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        let msg = out.begin_handshake(HandshakeType::Certificate);
        let list = out.reserve(3);
        for cert in &self.certificate_list {
            out.put_vector(3, cert)?;
        }
        out.patch_length(list)?;
        out.patch_length(msg)
    }

    /// Decode a Certificate body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(body);
        let mut list = Reader::new(reader.read_vec24()?);
        reader.expect_empty("Certificate")?;

        let mut certificate_list = Vec::new();
        while !list.is_empty() {
            certificate_list.push(list.read_vec24()?.to_vec());
        }
        Ok(Self { certificate_list })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_chain() {
        let msg = Certificate::new(vec![vec![0x30, 0x00], vec![0x30, 0x01, 0x05]]);
        let mut out = Emitter::new();
        msg.encode(&mut out).unwrap();
        let bytes = out.into_vec();

        assert_eq!(
            bytes,
            vec![11, 0, 0, 14, 0, 0, 11, 0, 0, 2, 0x30, 0x00, 0, 0, 3, 0x30, 0x01, 0x05]
        );
        let decoded = Certificate::decode(&bytes[4..]).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.leaf(), Some(&[0x30, 0x00][..]));
    }

    #[test]
    fn test_empty_certificate_list() {
        let decoded = Certificate::decode(&[0, 0, 0]).unwrap();
        assert!(decoded.certificate_list.is_empty());
        assert_eq!(decoded.leaf(), None);
    }

    #[test]
    fn test_certificate_length_mismatch() {
        // inner length runs past the list
        assert!(Certificate::decode(&[0, 0, 4, 0, 0, 5, 1]).is_err());
        // trailing bytes after the list
        assert!(Certificate::decode(&[0, 0, 0, 9]).is_err());
    }
}
