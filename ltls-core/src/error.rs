//! Error types for the ltls engine.
//!
//! Every failure is fatal to the connection: the caller disposes the
//! connection state and the session becomes unusable. [`Error::category`]
//! groups errors the way callers usually need to react to them, and
//! [`Error::to_alert`] gives the alert to send the peer when the transport
//! is still usable.

use core::fmt;

/// Result type for ltls operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur in ltls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration
    InvalidConfig(String),

    /// Protocol error
    ProtocolError(ProtocolError),

    /// Cryptographic error
    CryptoError(String),

    /// I/O error (transport failures and timeouts)
    IoError(String),

    /// Handshake failure
    HandshakeFailure(String),

    /// Fatal alert received from peer
    AlertReceived(AlertDescription),

    /// Message not legal in the current connection mode
    UnexpectedMessage(String),

    /// Invalid message format
    InvalidMessage(String),

    /// Malformed ASN.1 / DER data
    Asn1Error(String),

    /// Peer chose a parameter we did not offer
    IllegalParameter(String),

    /// Cipher suite id not in the registry
    UnknownCipherSuite(u16),

    /// Protocol version outside the configured range
    UnsupportedVersion(u16),

    /// Record MAC or padding check failed
    DecryptionFailed,

    /// Finished verify data did not match
    VerifyDataMismatch,

    /// Unsupported feature
    UnsupportedFeature(String),

    /// Connection was closed or disposed
    ConnectionClosed,

    /// Internal error
    InternalError(String),
}

/// Coarse error groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Peer violated the protocol (illegal transition, bad encoding, unknown suite, ...)
    Protocol,
    /// Record MAC, padding or Finished verification failed
    Authentication,
    /// Peer sent a fatal alert
    PeerAlert,
    /// Transport error or timeout
    Transport,
    /// Local configuration rejected
    Configuration,
    /// Crypto backend or internal invariant failure
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig(_) => ErrorCategory::Configuration,
            Error::ProtocolError(ProtocolError::BadRecordMac) => ErrorCategory::Authentication,
            Error::ProtocolError(_)
            | Error::HandshakeFailure(_)
            | Error::UnexpectedMessage(_)
            | Error::InvalidMessage(_)
            | Error::Asn1Error(_)
            | Error::IllegalParameter(_)
            | Error::UnknownCipherSuite(_)
            | Error::UnsupportedVersion(_)
            | Error::UnsupportedFeature(_) => ErrorCategory::Protocol,
            Error::DecryptionFailed | Error::VerifyDataMismatch => ErrorCategory::Authentication,
            Error::AlertReceived(_) => ErrorCategory::PeerAlert,
            Error::IoError(_) | Error::ConnectionClosed => ErrorCategory::Transport,
            Error::CryptoError(_) | Error::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// The fatal alert to send for a locally detected error.
    ///
    /// Returns `None` when no alert should be sent (peer alerts, transport
    /// failures, configuration errors).
    pub fn to_alert(&self) -> Option<AlertDescription> {
        match self {
            Error::ProtocolError(e) => Some(e.alert()),
            Error::HandshakeFailure(_) => Some(AlertDescription::HandshakeFailure),
            Error::UnexpectedMessage(_) => Some(AlertDescription::UnexpectedMessage),
            Error::InvalidMessage(_) => Some(AlertDescription::DecodeError),
            Error::Asn1Error(_) => Some(AlertDescription::BadCertificate),
            Error::IllegalParameter(_) | Error::UnknownCipherSuite(_) => {
                Some(AlertDescription::IllegalParameter)
            },
            Error::UnsupportedVersion(_) => Some(AlertDescription::ProtocolVersion),
            Error::DecryptionFailed => Some(AlertDescription::BadRecordMac),
            Error::VerifyDataMismatch => Some(AlertDescription::DecryptError),
            Error::UnsupportedFeature(_) => Some(AlertDescription::HandshakeFailure),
            Error::CryptoError(_) | Error::InternalError(_) => {
                Some(AlertDescription::InternalError)
            },
            Error::InvalidConfig(_)
            | Error::IoError(_)
            | Error::AlertReceived(_)
            | Error::ConnectionClosed => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::ProtocolError(e) => write!(f, "Protocol error: {:?}", e),
            Error::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            Error::IoError(msg) => write!(f, "I/O error: {}", msg),
            Error::HandshakeFailure(msg) => write!(f, "Handshake failure: {}", msg),
            Error::AlertReceived(desc) => {
                write!(f, "Alert received: {} ({})", desc.name(), desc.description())
            },
            Error::UnexpectedMessage(msg) => write!(f, "Unexpected message: {}", msg),
            Error::InvalidMessage(msg) => write!(f, "Invalid message: {}", msg),
            Error::Asn1Error(msg) => write!(f, "ASN.1 decode error: {}", msg),
            Error::IllegalParameter(msg) => write!(f, "Illegal parameter: {}", msg),
            Error::UnknownCipherSuite(id) => write!(f, "Unknown cipher suite: 0x{:04X}", id),
            Error::UnsupportedVersion(v) => write!(f, "Unsupported protocol version: 0x{:04X}", v),
            Error::DecryptionFailed => write!(f, "Decryption failed: bad record MAC"),
            Error::VerifyDataMismatch => write!(f, "Finished verify data mismatch"),
            Error::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
            Error::ConnectionClosed => write!(f, "Connection closed"),
            Error::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<ltls_crypto::Error> for Error {
    fn from(e: ltls_crypto::Error) -> Self {
        Error::CryptoError(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        let kind = match e.category() {
            ErrorCategory::Transport => std::io::ErrorKind::BrokenPipe,
            ErrorCategory::Configuration => std::io::ErrorKind::InvalidInput,
            _ => std::io::ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, e)
    }
}

/// Protocol-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolError {
    /// Decode error
    DecodeError,

    /// Bad record MAC
    BadRecordMac,

    /// Record overflow
    RecordOverflow,

    /// Bad certificate
    BadCertificate,

    /// Unsupported certificate
    UnsupportedCertificate,

    /// Illegal parameter
    IllegalParameter,
}

impl ProtocolError {
    /// The alert reporting this error.
    pub const fn alert(self) -> AlertDescription {
        match self {
            ProtocolError::DecodeError => AlertDescription::DecodeError,
            ProtocolError::BadRecordMac => AlertDescription::BadRecordMac,
            ProtocolError::RecordOverflow => AlertDescription::RecordOverflow,
            ProtocolError::BadCertificate => AlertDescription::BadCertificate,
            ProtocolError::UnsupportedCertificate => AlertDescription::UnsupportedCertificate,
            ProtocolError::IllegalParameter => AlertDescription::IllegalParameter,
        }
    }
}

/// TLS alert descriptions (RFC 5246 Section 7.2, RFC 6066).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertDescription {
    /// Close notify
    CloseNotify = 0,

    /// Unexpected message
    UnexpectedMessage = 10,

    /// Bad record MAC
    BadRecordMac = 20,

    /// Decryption failed (reserved since TLS 1.1)
    DecryptionFailed = 21,

    /// Record overflow
    RecordOverflow = 22,

    /// Decompression failure
    DecompressionFailure = 30,

    /// Handshake failure
    HandshakeFailure = 40,

    /// No certificate (SSL 3.0, reserved)
    NoCertificate = 41,

    /// Bad certificate
    BadCertificate = 42,

    /// Unsupported certificate
    UnsupportedCertificate = 43,

    /// Certificate revoked
    CertificateRevoked = 44,

    /// Certificate expired
    CertificateExpired = 45,

    /// Certificate unknown
    CertificateUnknown = 46,

    /// Illegal parameter
    IllegalParameter = 47,

    /// Unknown CA
    UnknownCa = 48,

    /// Access denied
    AccessDenied = 49,

    /// Decode error
    DecodeError = 50,

    /// Decrypt error
    DecryptError = 51,

    /// Export restriction (reserved)
    ExportRestriction = 60,

    /// Protocol version
    ProtocolVersion = 70,

    /// Insufficient security
    InsufficientSecurity = 71,

    /// Internal error
    InternalError = 80,

    /// User canceled
    UserCanceled = 90,

    /// No renegotiation
    NoRenegotiation = 100,

    /// Unsupported extension
    UnsupportedExtension = 110,

    /// Unrecognized name
    UnrecognizedName = 112,
}

/// (code, name, description) for every known alert.
const ALERT_TABLE: &[(AlertDescription, &str, &str)] = &[
    (AlertDescription::CloseNotify, "close_notify", "The peer is closing the connection"),
    (AlertDescription::UnexpectedMessage, "unexpected_message", "An inappropriate message was received"),
    (AlertDescription::BadRecordMac, "bad_record_mac", "A record was received with an incorrect MAC"),
    (AlertDescription::DecryptionFailed, "decryption_failed", "A ciphertext could not be decrypted"),
    (AlertDescription::RecordOverflow, "record_overflow", "A record exceeded the maximum length"),
    (AlertDescription::DecompressionFailure, "decompression_failure", "Decompression produced invalid input"),
    (AlertDescription::HandshakeFailure, "handshake_failure", "No acceptable set of security parameters"),
    (AlertDescription::NoCertificate, "no_certificate", "No certificate was available"),
    (AlertDescription::BadCertificate, "bad_certificate", "A certificate was corrupt or failed verification"),
    (AlertDescription::UnsupportedCertificate, "unsupported_certificate", "A certificate was of an unsupported type"),
    (AlertDescription::CertificateRevoked, "certificate_revoked", "A certificate was revoked by its signer"),
    (AlertDescription::CertificateExpired, "certificate_expired", "A certificate has expired or is not yet valid"),
    (AlertDescription::CertificateUnknown, "certificate_unknown", "A certificate could not be processed"),
    (AlertDescription::IllegalParameter, "illegal_parameter", "A handshake field was out of range or inconsistent"),
    (AlertDescription::UnknownCa, "unknown_ca", "The CA certificate could not be located or trusted"),
    (AlertDescription::AccessDenied, "access_denied", "Access was denied by the peer's policy"),
    (AlertDescription::DecodeError, "decode_error", "A message could not be decoded"),
    (AlertDescription::DecryptError, "decrypt_error", "A handshake cryptographic operation failed"),
    (AlertDescription::ExportRestriction, "export_restriction", "Negotiation did not comply with export restrictions"),
    (AlertDescription::ProtocolVersion, "protocol_version", "The protocol version is recognized but not supported"),
    (AlertDescription::InsufficientSecurity, "insufficient_security", "The peer requires more secure ciphers"),
    (AlertDescription::InternalError, "internal_error", "The peer hit an internal error"),
    (AlertDescription::UserCanceled, "user_canceled", "The handshake was canceled"),
    (AlertDescription::NoRenegotiation, "no_renegotiation", "Renegotiation is not permitted"),
    (AlertDescription::UnsupportedExtension, "unsupported_extension", "An unsolicited extension was received"),
    (AlertDescription::UnrecognizedName, "unrecognized_name", "The requested server name is not recognized"),
];

impl AlertDescription {
    /// Convert from wire format (u8).
    pub fn from_u8(value: u8) -> Option<Self> {
        ALERT_TABLE
            .iter()
            .find(|(desc, _, _)| desc.to_u8() == value)
            .map(|(desc, _, _)| *desc)
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// The RFC name, e.g. `bad_record_mac`.
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Human-readable explanation of the alert.
    pub fn description(self) -> &'static str {
        self.entry().2
    }

    fn entry(self) -> &'static (AlertDescription, &'static str, &'static str) {
        // Every variant has a table row (checked by test_alert_table_complete).
        ALERT_TABLE
            .iter()
            .find(|(desc, _, _)| *desc == self)
            .unwrap_or(&ALERT_TABLE[0])
    }
}

impl fmt::Display for AlertDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
