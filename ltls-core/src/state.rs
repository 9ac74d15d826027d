//! Handshake state machine.
//!
//! The connection has a single current [`HandshakeMode`]. A message read
//! from the peer may only move it along an edge of [`READ_TRANSITIONS`];
//! a message we send may only move it along an edge of
//! [`WRITE_TRANSITIONS`]. The two tables interlock:
//!
//! ```text
//!            read                          write
//! ClientHello ──► ServerHello
//! ServerHello ──► Certificate
//! Certificate ──► ServerKeyExchange | ServerHelloDone
//! ServerKeyExchange ──► ServerHelloDone
//!                               ServerHelloDone ──► ClientKeyExchange
//!                               ClientKeyExchange ──► ChangeCipherSpec
//!                               ChangeCipherSpec ──► Finished
//! Finished ──► ChangeCipherSpec | Alert
//! ChangeCipherSpec ──► EncryptedHandshake
//! EncryptedHandshake ──► Application      EncryptedHandshake ──► Application
//! Application ──► Application | Alert     Application ──► Application | Alert
//!                               Alert ──► CloseNotify
//! CloseNotify ──► Alert
//! ```
//!
//! Fatal alerts bypass the tables entirely; the connection layer aborts
//! on them before consulting the machine.

use core::fmt;

use crate::error::{Error, Result};

/// Position of the connection in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeMode {
    /// ClientHello sent
    ClientHello,
    /// ServerHello received
    ServerHello,
    /// Certificate received
    Certificate,
    /// ServerKeyExchange received
    ServerKeyExchange,
    /// ServerHelloDone received
    ServerHelloDone,
    /// ClientKeyExchange sent
    ClientKeyExchange,
    /// ChangeCipherSpec sent or received
    ChangeCipherSpec,
    /// Client Finished sent
    Finished,
    /// Encrypted server Finished expected
    EncryptedHandshake,
    /// Handshake complete, application data flowing
    Application,
    /// Alert exchanged
    Alert,
    /// close_notify sent
    CloseNotify,
}

impl HandshakeMode {
    /// Every mode, in handshake order.
    pub const ALL: [HandshakeMode; 12] = [
        HandshakeMode::ClientHello,
        HandshakeMode::ServerHello,
        HandshakeMode::Certificate,
        HandshakeMode::ServerKeyExchange,
        HandshakeMode::ServerHelloDone,
        HandshakeMode::ClientKeyExchange,
        HandshakeMode::ChangeCipherSpec,
        HandshakeMode::Finished,
        HandshakeMode::EncryptedHandshake,
        HandshakeMode::Application,
        HandshakeMode::Alert,
        HandshakeMode::CloseNotify,
    ];

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            HandshakeMode::ClientHello => "ClientHello",
            HandshakeMode::ServerHello => "ServerHello",
            HandshakeMode::Certificate => "Certificate",
            HandshakeMode::ServerKeyExchange => "ServerKeyExchange",
            HandshakeMode::ServerHelloDone => "ServerHelloDone",
            HandshakeMode::ClientKeyExchange => "ClientKeyExchange",
            HandshakeMode::ChangeCipherSpec => "ChangeCipherSpec",
            HandshakeMode::Finished => "Finished",
            HandshakeMode::EncryptedHandshake => "EncryptedHandshake",
            HandshakeMode::Application => "Application",
            HandshakeMode::Alert => "Alert",
            HandshakeMode::CloseNotify => "CloseNotify",
        }
    }
}

impl fmt::Display for HandshakeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side produced the message driving a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Message received from the server
    Read,
    /// Message sent by the client
    Write,
}

use HandshakeMode as M;

/// Legal transitions for received messages.
pub const READ_TRANSITIONS: &[(HandshakeMode, &[HandshakeMode])] = &[
    (M::ClientHello, &[M::ServerHello]),
    (M::ServerHello, &[M::Certificate]),
    (M::Certificate, &[M::ServerHelloDone, M::ServerKeyExchange]),
    (M::ServerKeyExchange, &[M::ServerHelloDone]),
    (M::Finished, &[M::ChangeCipherSpec, M::Alert]),
    (M::ChangeCipherSpec, &[M::EncryptedHandshake]),
    (M::EncryptedHandshake, &[M::Application]),
    (M::Application, &[M::Application, M::Alert]),
    (M::Alert, &[]),
    (M::CloseNotify, &[M::Alert]),
];

/// Legal transitions for sent messages.
pub const WRITE_TRANSITIONS: &[(HandshakeMode, &[HandshakeMode])] = &[
    (M::ServerHelloDone, &[M::ClientKeyExchange]),
    (M::ClientKeyExchange, &[M::ChangeCipherSpec]),
    (M::ChangeCipherSpec, &[M::Finished]),
    (M::EncryptedHandshake, &[M::Application]),
    (M::Application, &[M::Application, M::Alert]),
    (M::Alert, &[M::CloseNotify]),
    (M::CloseNotify, &[]),
];

/// Modes reachable from `from` in one step of `direction`.
pub fn legal_successors(direction: Direction, from: HandshakeMode) -> &'static [HandshakeMode] {
    let table = match direction {
        Direction::Read => READ_TRANSITIONS,
        Direction::Write => WRITE_TRANSITIONS,
    };
    table
        .iter()
        .find(|(mode, _)| *mode == from)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

/// Whether `from -> to` is an edge of the `direction` table.
pub fn is_legal(direction: Direction, from: HandshakeMode, to: HandshakeMode) -> bool {
    legal_successors(direction, from).contains(&to)
}

/// Current mode plus the transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMachine {
    mode: HandshakeMode,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Start in `ClientHello`, the mode entered by sending the hello.
    pub fn new() -> Self {
        Self {
            mode: HandshakeMode::ClientHello,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> HandshakeMode {
        self.mode
    }

    /// Move to `next`, or fail with `unexpected_message`.
    ///
    /// The mode is left unchanged on failure.
    pub fn advance(&mut self, direction: Direction, next: HandshakeMode) -> Result<()> {
        if !is_legal(direction, self.mode, next) {
            return Err(Error::UnexpectedMessage(format!(
                "{:?} {} not allowed in mode {}",
                direction, next, self.mode
            )));
        }
        self.mode = next;
        Ok(())
    }

    /// Handshake finished and not yet closing.
    pub fn is_application(&self) -> bool {
        self.mode == HandshakeMode::Application
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_rsa_handshake_path() {
        let mut sm = StateMachine::new();
        let steps = [
            (Direction::Read, M::ServerHello),
            (Direction::Read, M::Certificate),
            (Direction::Read, M::ServerHelloDone),
            (Direction::Write, M::ClientKeyExchange),
            (Direction::Write, M::ChangeCipherSpec),
            (Direction::Write, M::Finished),
            (Direction::Read, M::ChangeCipherSpec),
            (Direction::Read, M::EncryptedHandshake),
            (Direction::Read, M::Application),
            (Direction::Write, M::Application),
            (Direction::Read, M::Application),
            (Direction::Write, M::Alert),
            (Direction::Write, M::CloseNotify),
            (Direction::Read, M::Alert),
        ];
        for (direction, next) in steps {
            sm.advance(direction, next).unwrap();
            assert_eq!(sm.mode(), next);
        }
    }

    #[test]
    fn test_dhe_path_through_server_key_exchange() {
        let mut sm = StateMachine::new();
        sm.advance(Direction::Read, M::ServerHello).unwrap();
        sm.advance(Direction::Read, M::Certificate).unwrap();
        sm.advance(Direction::Read, M::ServerKeyExchange).unwrap();
        sm.advance(Direction::Read, M::ServerHelloDone).unwrap();
        assert!(sm.advance(Direction::Read, M::ServerKeyExchange).is_err());
    }

    #[test]
    fn test_finished_before_change_cipher_spec_rejected() {
        let mut sm = StateMachine::new();
        sm.advance(Direction::Read, M::ServerHello).unwrap();
        let err = sm.advance(Direction::Read, M::Finished).unwrap_err();
        assert!(matches!(err, Error::UnexpectedMessage(_)));
        assert_eq!(sm.mode(), M::ServerHello);
    }

    #[test]
    fn test_table_sizes() {
        assert_eq!(READ_TRANSITIONS.iter().filter(|(_, n)| !n.is_empty()).count(), 9);
        assert_eq!(READ_TRANSITIONS.iter().map(|(_, n)| n.len()).sum::<usize>(), 12);
        assert_eq!(WRITE_TRANSITIONS.iter().filter(|(_, n)| !n.is_empty()).count(), 6);
        assert_eq!(WRITE_TRANSITIONS.iter().map(|(_, n)| n.len()).sum::<usize>(), 7);
    }

    #[test]
    fn test_exhaustive_legality() {
        for direction in [Direction::Read, Direction::Write] {
            for from in HandshakeMode::ALL {
                for to in HandshakeMode::ALL {
                    let mut sm = StateMachine { mode: from };
                    let legal = is_legal(direction, from, to);
                    assert_eq!(sm.advance(direction, to).is_ok(), legal);
                    assert_eq!(sm.mode(), if legal { to } else { from });
                }
            }
        }
    }

    #[test]
    fn test_terminal_modes() {
        assert!(legal_successors(Direction::Read, M::Alert).is_empty());
        assert!(legal_successors(Direction::Write, M::CloseNotify).is_empty());
        assert!(legal_successors(Direction::Write, M::ClientHello).is_empty());
    }
}
