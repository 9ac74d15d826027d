//! Finished message (RFC 5246 Section 7.4.9).

use crate::codec::Emitter;
use crate::error::{Error, Result};
use crate::prf::VERIFY_DATA_LENGTH;
use crate::protocol::HandshakeType;

/// Finished message.
///
/// Contains `verify_data`, the PRF over the master secret and the
/// handshake transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    /// Verify data
    pub verify_data: Vec<u8>,
}

impl Finished {
    pub fn new(verify_data: Vec<u8>) -> Self {
        Self { verify_data }
    }

    /// Append the handshake message to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        let msg = out.begin_handshake(HandshakeType::Finished);
        out.put_slice(&self.verify_data);
        out.patch_length(msg)
    }

    /// Decode a Finished body; exactly 12 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() != VERIFY_DATA_LENGTH {
            return Err(Error::InvalidMessage(format!(
                "Finished verify data is {} bytes, expected {}",
                body.len(),
                VERIFY_DATA_LENGTH
            )));
        }
        Ok(Self {
            verify_data: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished() {
        let finished = Finished::new(vec![0x77; 12]);
        let mut out = Emitter::new();
        finished.encode(&mut out).unwrap();
        let bytes = out.into_vec();
        assert_eq!(&bytes[..4], &[20, 0, 0, 12]);
        assert_eq!(Finished::decode(&bytes[4..]).unwrap(), finished);
    }

    #[test]
    fn test_finished_wrong_length() {
        assert!(Finished::decode(&[0; 11]).is_err());
        assert!(Finished::decode(&[0; 36]).is_err());
    }
}
