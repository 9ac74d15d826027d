//! Blocking TLS session over any `Read + Write` transport.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;

use ltls_core::cipher_suites::CipherSuite;
use ltls_core::{ClientConnection, Error, ProtocolVersion, Result};

use crate::ClientConfig;

/// Size of the transport read buffer (one maximal record plus header).
const READ_BUFFER_SIZE: usize = 18 * 1024;

/// A TLS client session.
///
/// `open` drives the handshake to completion; afterwards `read`/`write`
/// move application data. Any error disposes the session.
pub struct Session<T> {
    transport: T,
    conn: ClientConnection,
    buf: Vec<u8>,
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("conn", &self.conn).finish_non_exhaustive()
    }
}

impl Session<TcpStream> {
    /// Open a TCP connection to `host:port` and complete the handshake.
    ///
    /// `host` is sent as SNI unless the config names a server already or
    /// `host` is an IP address.
    pub fn connect(host: &str, port: u16, config: &ClientConfig) -> Result<Self> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_read_timeout(config.io_timeout)?;
        stream.set_write_timeout(config.io_timeout)?;
        stream.set_nodelay(true)?;
        tracing::debug!(host, port, "tcp connected");
        Self::open(&config.for_host(host), stream)
    }
}

impl<T: Read + Write> Session<T> {
    /// Run the handshake over `transport`.
    pub fn open(config: &ClientConfig, transport: T) -> Result<Self> {
        let conn = ClientConnection::new(config.config.clone(), config.provider.clone())?;
        let mut session = Self {
            transport,
            conn,
            buf: vec![0u8; READ_BUFFER_SIZE],
        };

        session.conn.start()?;
        session.flush()?;
        while !session.conn.is_handshake_complete() {
            if session.fill()? == 0 {
                session.conn.dispose();
                return Err(Error::IoError("transport closed during handshake".into()));
            }
        }
        tracing::info!(
            version = ?session.conn.negotiated_version(),
            "session open"
        );
        Ok(session)
    }

    /// Read decrypted application data.
    ///
    /// Blocks until data arrives. Returns `Ok(0)` once the server has
    /// closed the connection and everything buffered has been read.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.conn.plaintext_len() > 0 {
                return Ok(self.conn.read_plaintext(buf));
            }
            if self.conn.is_closed() {
                return Ok(0);
            }
            if self.fill()? == 0 {
                tracing::warn!("transport closed without close_notify");
                self.conn.dispose();
                return Ok(0);
            }
        }
    }

    /// Take whatever application data is already buffered, without blocking.
    pub fn read_available(&mut self) -> Vec<u8> {
        self.conn.take_plaintext()
    }

    /// Encrypt and send `data`. Only legal once the handshake is complete.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = self.conn.write_application_data(data)?;
        self.flush()?;
        Ok(n)
    }

    /// Send close_notify, wait for the server's, and dispose.
    pub fn close(&mut self) -> Result<()> {
        if self.conn.is_closed() {
            return Ok(());
        }
        self.conn.close()?;
        self.flush()?;
        while !self.conn.is_closed() {
            match self.fill() {
                Ok(0) => break,
                Ok(_) => {},
                // peer already gone; our close_notify went out
                Err(Error::IoError(_)) => break,
                Err(e) => return Err(e),
            }
        }
        self.conn.dispose();
        Ok(())
    }

    /// Application data can still be exchanged.
    pub fn is_open(&self) -> bool {
        self.conn.is_open()
    }

    /// Decrypted bytes waiting to be read.
    pub fn buffered_len(&self) -> usize {
        self.conn.plaintext_len()
    }

    /// Version chosen by the server.
    pub fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.conn.negotiated_version()
    }

    /// Cipher suite chosen by the server.
    pub fn cipher_suite(&self) -> Option<&'static CipherSuite> {
        self.conn.cipher_suite()
    }

    /// Server certificate chain, leaf first (not validated).
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        self.conn.peer_certificates()
    }

    /// The underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, mutably.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Write everything the connection has queued.
    fn flush(&mut self) -> Result<()> {
        let out = self.conn.take_outgoing();
        if out.is_empty() {
            return Ok(());
        }
        let result = self
            .transport
            .write_all(&out)
            .and_then(|()| self.transport.flush());
        if let Err(e) = result {
            self.conn.dispose();
            return Err(e.into());
        }
        Ok(())
    }

    /// One transport read fed to the connection. Returns bytes read.
    fn fill(&mut self) -> Result<usize> {
        let n = loop {
            match self.transport.read(&mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.conn.dispose();
                    return Err(e.into());
                },
            }
        };
        if n == 0 {
            return Ok(0);
        }

        let result = self.conn.read_tls(&self.buf[..n]);
        // alerts and replies go out even when processing failed
        let flushed = self.flush();
        result?;
        flushed?;
        Ok(n)
    }
}
