//! ServerHelloDone message (RFC 5246 Section 7.4.5). Empty body.

use crate::codec::Emitter;
use crate::error::{Error, Result};
use crate::protocol::HandshakeType;

/// ServerHelloDone message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerHelloDone;

impl ServerHelloDone {
    /// Append the handshake message to `out`.
    pub fn encode(&self, out: &mut Emitter) -> Result<()> {
        let msg = out.begin_handshake(HandshakeType::ServerHelloDone);
        out.patch_length(msg)
    }

    /// Decode a ServerHelloDone body, which must be empty.
    pub fn decode(body: &[u8]) -> Result<Self> {
        if !body.is_empty() {
            return Err(Error::InvalidMessage(format!(
                "ServerHelloDone has {} byte body",
                body.len()
            )));
        }
        Ok(Self)
    }
}
