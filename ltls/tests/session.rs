//! Blocking `Session` over an in-memory transport.

#[path = "../../ltls-core/tests/common/mod.rs"]
mod common;

use std::io::{self, Read, Write};

use common::{MemoryTransport, ServerOptions, TestServer};
use ltls::{ClientConfig, Error, ProtocolVersion, Session};
use ltls_core::alert::Alert;

fn transport(version: ProtocolVersion, suite: u16) -> MemoryTransport {
    common::init_tracing();
    MemoryTransport::new(TestServer::new(ServerOptions::new(version, suite)))
}

#[test]
fn test_session_round_trip() {
    let config = ClientConfig::builder()
        .with_server_name("mem.test")
        .build()
        .unwrap();
    let mut session = Session::open(&config, transport(ProtocolVersion::Tls12, 0x0067)).unwrap();

    assert!(session.is_open());
    assert_eq!(session.negotiated_version(), Some(ProtocolVersion::Tls12));
    assert_eq!(session.cipher_suite().map(|s| s.id), Some(0x0067));
    assert_eq!(session.peer_certificates().len(), 1);
    assert_eq!(session.get_ref().server.server_name.as_deref(), Some("mem.test"));

    assert_eq!(session.write(b"ping").unwrap(), 4);
    let mut buf = [0u8; 16];
    let n = session.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"ping");

    session.close().unwrap();
    assert!(!session.is_open());
    assert_eq!(session.get_ref().server.alerts, vec![Alert::close_notify()]);
    assert_eq!(session.write(b"again"), Err(Error::ConnectionClosed));
}

#[test]
fn test_session_tiny_transport_reads() {
    let mut transport = transport(ProtocolVersion::Tls10, 0x002F);
    transport.max_read = 3;
    let mut session = Session::open(&ClientConfig::default(), transport).unwrap();

    session.write(b"fragmented transport").unwrap();
    let mut received = Vec::new();
    let mut buf = [0u8; 8];
    while received.len() < 20 {
        let n = session.read(&mut buf).unwrap();
        assert!(n > 0);
        received.extend_from_slice(&buf[..n]);
    }
    assert_eq!(received, b"fragmented transport".to_vec());
}

#[test]
fn test_session_buffered_data() {
    let mut session =
        Session::open(&ClientConfig::default(), transport(ProtocolVersion::Tls11, 0x0005)).unwrap();

    let transport = session.get_mut();
    let mut records = transport.server.send_application_data(b"first ");
    records.extend(transport.server.send_application_data(b"second"));
    transport.push_inbound(&records);

    let mut buf = [0u8; 4];
    assert_eq!(session.read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b"firs");
    assert_eq!(session.buffered_len(), 8);
    assert_eq!(session.read_available(), b"t second".to_vec());
    assert_eq!(session.buffered_len(), 0);
}

#[test]
fn test_session_server_close() {
    let mut session =
        Session::open(&ClientConfig::default(), transport(ProtocolVersion::Tls12, 0x0035)).unwrap();

    let transport = session.get_mut();
    let close = transport.server.close();
    transport.push_inbound(&close);

    let mut buf = [0u8; 16];
    assert_eq!(session.read(&mut buf).unwrap(), 0);
    assert!(!session.is_open());
    // our close_notify reply reached the server
    assert_eq!(session.get_ref().server.alerts, vec![Alert::close_notify()]);
    session.close().unwrap();
}

#[test]
fn test_session_handshake_failure() {
    let config = ClientConfig::builder()
        .with_cipher_suites(&[0x002F])
        .build()
        .unwrap();
    let err = Session::open(&config, transport(ProtocolVersion::Tls12, 0x0035)).unwrap_err();
    assert!(matches!(err, Error::IllegalParameter(_)));
}

/// Transport that accepts writes and never answers.
struct Silent;

impl Read for Silent {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

impl Write for Silent {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_session_eof_during_handshake() {
    let err = Session::open(&ClientConfig::default(), Silent).unwrap_err();
    assert!(matches!(err, Error::IoError(_)));
    assert_eq!(err.category(), ltls::ErrorCategory::Transport);
}

/// Transport whose reads time out.
struct TimingOut;

impl Read for TimingOut {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
    }
}

impl Write for TimingOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_session_transport_timeout() {
    let err = Session::open(&ClientConfig::default(), TimingOut).unwrap_err();
    match err {
        Error::IoError(msg) => assert!(msg.contains("timed out")),
        other => panic!("expected IoError, got {:?}", other),
    }
}
