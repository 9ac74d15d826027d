//! TLS protocol constants and types.

/// TLS protocol version.
///
/// Ordered, so `Tls10 < Tls11 < Tls12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// TLS 1.0 (RFC 2246)
    Tls10 = 0x0301,

    /// TLS 1.1 (RFC 4346)
    Tls11 = 0x0302,

    /// TLS 1.2 (RFC 5246)
    Tls12 = 0x0303,
}

impl ProtocolVersion {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0301 => Some(ProtocolVersion::Tls10),
            0x0302 => Some(ProtocolVersion::Tls11),
            0x0303 => Some(ProtocolVersion::Tls12),
            _ => None,
        }
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Wire bytes, major then minor.
    pub const fn to_bytes(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }

    /// Get the protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Tls10 => "TLS 1.0",
            ProtocolVersion::Tls11 => "TLS 1.1",
            ProtocolVersion::Tls12 => "TLS 1.2",
        }
    }

    /// CBC records carry an explicit per-record IV from TLS 1.1 on.
    pub const fn has_explicit_iv(self) -> bool {
        !matches!(self, ProtocolVersion::Tls10)
    }

    /// TLS 1.2 replaces the MD5/SHA-1 PRF with P_SHA256.
    pub const fn uses_sha256_prf(self) -> bool {
        matches!(self, ProtocolVersion::Tls12)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// TLS record content type (RFC 5246 Section 6.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    /// Change cipher spec (20)
    ChangeCipherSpec = 20,

    /// Alert (21)
    Alert = 21,

    /// Handshake (22)
    Handshake = 22,

    /// Application data (23)
    ApplicationData = 23,
}

impl ContentType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            20 => Some(ContentType::ChangeCipherSpec),
            21 => Some(ContentType::Alert),
            22 => Some(ContentType::Handshake),
            23 => Some(ContentType::ApplicationData),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Handshake message type (RFC 5246 Section 7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeType {
    /// ClientHello (1)
    ClientHello = 1,

    /// ServerHello (2)
    ServerHello = 2,

    /// Certificate (11)
    Certificate = 11,

    /// ServerKeyExchange (12)
    ServerKeyExchange = 12,

    /// ServerHelloDone (14)
    ServerHelloDone = 14,

    /// ClientKeyExchange (16)
    ClientKeyExchange = 16,

    /// Finished (20)
    Finished = 20,
}

impl HandshakeType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(HandshakeType::ClientHello),
            2 => Some(HandshakeType::ServerHello),
            11 => Some(HandshakeType::Certificate),
            12 => Some(HandshakeType::ServerKeyExchange),
            14 => Some(HandshakeType::ServerHelloDone),
            16 => Some(HandshakeType::ClientKeyExchange),
            20 => Some(HandshakeType::Finished),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Size of the client and server random values.
pub const RANDOM_SIZE: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_wire_format() {
        assert_eq!(ProtocolVersion::from_u16(0x0301), Some(ProtocolVersion::Tls10));
        assert_eq!(ProtocolVersion::from_u16(0x0303), Some(ProtocolVersion::Tls12));
        assert_eq!(ProtocolVersion::from_u16(0x0304), None);
        assert_eq!(ProtocolVersion::from_u16(0x0300), None);
        assert_eq!(ProtocolVersion::Tls11.to_bytes(), [0x03, 0x02]);
    }

    #[test]
    fn test_version_ordering() {
        assert!(ProtocolVersion::Tls10 < ProtocolVersion::Tls11);
        assert!(ProtocolVersion::Tls11 < ProtocolVersion::Tls12);
        assert!(!ProtocolVersion::Tls10.has_explicit_iv());
        assert!(ProtocolVersion::Tls11.has_explicit_iv());
        assert!(ProtocolVersion::Tls12.uses_sha256_prf());
    }

    #[test]
    fn test_content_type_conversion() {
        assert_eq!(ContentType::from_u8(20), Some(ContentType::ChangeCipherSpec));
        assert_eq!(ContentType::from_u8(23), Some(ContentType::ApplicationData));
        assert_eq!(ContentType::from_u8(24), None);
        assert_eq!(ContentType::Alert.to_u8(), 21);
    }

    #[test]
    fn test_handshake_type_conversion() {
        for value in [1u8, 2, 11, 12, 14, 16, 20] {
            assert_eq!(HandshakeType::from_u8(value).unwrap().to_u8(), value);
        }
        assert_eq!(HandshakeType::from_u8(13), None);
    }
}
