//! TLS alert protocol.

use crate::error::{AlertDescription, Error, Result};

/// Alert level (RFC 5246 Section 7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertLevel {
    /// Warning (1)
    Warning = 1,

    /// Fatal (2)
    Fatal = 2,
}

impl AlertLevel {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AlertLevel::Warning),
            2 => Some(AlertLevel::Fatal),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TLS alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    /// Alert level
    pub level: AlertLevel,

    /// Alert description
    pub description: AlertDescription,
}

impl Alert {
    /// Create a new alert.
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    /// Create a fatal alert.
    pub fn fatal(description: AlertDescription) -> Self {
        Self {
            level: AlertLevel::Fatal,
            description,
        }
    }

    /// Create a close_notify alert.
    pub fn close_notify() -> Self {
        Self {
            level: AlertLevel::Warning,
            description: AlertDescription::CloseNotify,
        }
    }

    /// Encode the alert to bytes.
    pub fn encode(&self) -> [u8; 2] {
        [self.level.to_u8(), self.description.to_u8()]
    }

    /// Decode an alert from bytes.
    ///
    /// A fatal alert with a description we do not know is still reported
    /// as fatal, mapped to `handshake_failure`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != 2 {
            return Err(Error::InvalidMessage(format!(
                "Alert must be 2 bytes, got {}",
                data.len()
            )));
        }

        let level = AlertLevel::from_u8(data[0])
            .ok_or_else(|| Error::InvalidMessage(format!("Invalid alert level: {}", data[0])))?;

        let description = match AlertDescription::from_u8(data[1]) {
            Some(description) => description,
            None if level == AlertLevel::Fatal => AlertDescription::HandshakeFailure,
            None => {
                return Err(Error::InvalidMessage(format!(
                    "Invalid alert description: {}",
                    data[1]
                )))
            },
        };

        Ok(Self { level, description })
    }

    /// Check if this alert is fatal.
    ///
    /// In TLS 1.0-1.2 the level byte decides.
    pub fn is_fatal(&self) -> bool {
        self.level == AlertLevel::Fatal
    }

    /// Check if this is a close_notify.
    pub fn is_close_notify(&self) -> bool {
        self.description == AlertDescription::CloseNotify
    }
}
