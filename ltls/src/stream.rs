//! Async TLS stream implementation.

use std::time::Duration;

use ltls_core::cipher_suites::CipherSuite;
use ltls_core::{ClientConnection, Error, ProtocolVersion, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ClientConfig;

const READ_BUFFER_SIZE: usize = 18 * 1024;

/// TLS stream wrapping an underlying async transport.
///
/// The async counterpart of [`Session`](crate::Session).
pub struct TlsStream<S> {
    inner: S,
    conn: ClientConnection,
    buf: Vec<u8>,
}

impl<S> std::fmt::Debug for TlsStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsStream").field("conn", &self.conn).finish_non_exhaustive()
    }
}

impl<S> TlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Connect to a server (client-side).
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `server_name` - Server name for SNI (ignored for IP literals or
    ///   when the config already names a server)
    /// * `stream` - Underlying transport stream
    pub async fn connect(config: &ClientConfig, server_name: &str, stream: S) -> Result<Self> {
        let config = config.for_host(server_name);
        let conn = ClientConnection::new(config.config, config.provider)?;
        let mut tls = Self {
            inner: stream,
            conn,
            buf: vec![0u8; READ_BUFFER_SIZE],
        };

        tls.conn.start()?;
        tls.flush().await?;
        while !tls.conn.is_handshake_complete() {
            if tls.fill().await? == 0 {
                tls.conn.dispose();
                return Err(Error::IoError("transport closed during handshake".into()));
            }
        }
        tracing::info!(version = ?tls.conn.negotiated_version(), "stream open");
        Ok(tls)
    }

    /// [`connect`](Self::connect) bounded by `timeout`.
    ///
    /// An elapsed timeout is reported as [`Error::IoError`].
    pub async fn connect_timeout(
        config: &ClientConfig,
        server_name: &str,
        stream: S,
        timeout: Duration,
    ) -> Result<Self> {
        tokio::time::timeout(timeout, Self::connect(config, server_name, stream))
            .await
            .map_err(|_| Error::IoError(format!("handshake timed out after {:?}", timeout)))?
    }

    /// Read decrypted application data; `Ok(0)` after the server closed.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
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
            if self.fill().await? == 0 {
                tracing::warn!("transport closed without close_notify");
                self.conn.dispose();
                return Ok(0);
            }
        }
    }

    /// Encrypt and send all of `data`.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.conn.write_application_data(data)?;
        self.flush().await
    }

    /// Send close_notify, wait for the server's, and dispose.
    pub async fn close(&mut self) -> Result<()> {
        if self.conn.is_closed() {
            return Ok(());
        }
        self.conn.close()?;
        self.flush().await?;
        while !self.conn.is_closed() {
            match self.fill().await {
                Ok(0) | Err(Error::IoError(_)) => break,
                Ok(_) => {},
                Err(e) => return Err(e),
            }
        }
        self.conn.dispose();
        // best effort: the TLS close already happened
        let _ = self.inner.shutdown().await;
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

    /// The underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    async fn flush(&mut self) -> Result<()> {
        let out = self.conn.take_outgoing();
        if out.is_empty() {
            return Ok(());
        }
        let result = match self.inner.write_all(&out).await {
            Ok(()) => self.inner.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.conn.dispose();
            return Err(e.into());
        }
        Ok(())
    }

    async fn fill(&mut self) -> Result<usize> {
        let n = match self.inner.read(&mut self.buf).await {
            Ok(n) => n,
            Err(e) => {
                self.conn.dispose();
                return Err(e.into());
            },
        };
        if n == 0 {
            return Ok(0);
        }
        let result = self.conn.read_tls(&self.buf[..n]);
        let flushed = self.flush().await;
        result?;
        flushed?;
        Ok(n)
    }
}
