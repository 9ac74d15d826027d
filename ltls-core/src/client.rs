//! Sans-IO TLS client connection.
//!
//! [`ClientConnection`] owns the connection context and the state machine
//! but never touches a socket. The caller moves bytes:
//!
//! ```text
//!   start() ──► take_outgoing() ──► transport
//!   transport ──► read_tls() ──► take_outgoing()   (handshake replies, alerts)
//!                             └─► read_plaintext() (application data)
//!   write_application_data() ──► take_outgoing() ──► transport
//! ```
//!
//! Any error is fatal. Before returning it, the connection queues the
//! matching fatal alert (encrypted if write protection is active) and
//! disposes its key material; every later call fails with
//! [`Error::ConnectionClosed`].

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use ltls_crypto::CryptoProvider;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::alert::Alert;
use crate::cipher_suites::{self, CipherSuite};
use crate::codec::Emitter;
use crate::context::{ConnectionContext, ServerDhParams};
use crate::error::{Error, ProtocolError, Result};
use crate::key_block::KeyMaterial;
use crate::messages::{
    Certificate, ClientHello, ClientKeyExchange, Finished, HandshakeBuffer, HandshakeMessage,
    RawHandshake, ServerHello, ServerKeyExchange,
};
use crate::prf;
use crate::protocol::{ContentType, ProtocolVersion, RANDOM_SIZE};
use crate::record::{RecordBuffer, TlsPlaintext, MAX_FRAGMENT_SIZE};
use crate::record_protection::RecordProtection;
use crate::state::{Direction, HandshakeMode, StateMachine};
use crate::{certificate, Config};

/// Length of the RSA pre-master secret.
const PRE_MASTER_SECRET_LENGTH: usize = 48;

/// Outbound actions, executed in order by [`ClientConnection::emit`].
#[derive(Debug, Clone, Copy)]
enum Command<'a> {
    ClientHello,
    ClientKeyExchange,
    ChangeCipherSpec,
    Finished,
    ApplicationData(&'a [u8]),
    CloseNotify,
}

/// A TLS 1.0-1.2 client connection.
pub struct ClientConnection {
    config: Config,
    provider: Arc<dyn CryptoProvider>,
    state: StateMachine,
    context: ConnectionContext,
    records: RecordBuffer,
    handshake: HandshakeBuffer,
    outgoing: BytesMut,
    plaintext: BytesMut,
    started: bool,
    handshake_complete: bool,
    peer_closed: bool,
    closed: bool,
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("mode", &self.state.mode())
            .field("version", &self.context.version)
            .field("cipher_suite", &self.context.cipher_suite.map(|s| s.name))
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ClientConnection {
    /// Create a connection. Nothing is sent until [`start`](Self::start).
    pub fn new(config: Config, provider: Arc<dyn CryptoProvider>) -> Result<Self> {
        config.validate()?;
        let mut config = config;
        let max_version = config.max_version;
        config.cipher_suites.retain(|&id| {
            cipher_suites::lookup(id).map_or(false, |suite| suite.supports_version(max_version))
        });
        let context = ConnectionContext::new(config.min_version, config.max_version);
        Ok(Self {
            config,
            provider,
            state: StateMachine::new(),
            context,
            records: RecordBuffer::new(),
            handshake: HandshakeBuffer::new(),
            outgoing: BytesMut::new(),
            plaintext: BytesMut::new(),
            started: false,
            handshake_complete: false,
            peer_closed: false,
            closed: false,
        })
    }

    /// Queue the ClientHello.
    pub fn start(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.started {
            return Err(Error::InternalError("handshake already started".into()));
        }
        self.started = true;
        let result = self.emit(&[Command::ClientHello]);
        self.check(result)
    }

    /// Feed bytes received from the transport.
    ///
    /// Processes every complete record; partial records stay buffered
    /// until more bytes arrive.
    pub fn read_tls(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if !self.started {
            return Err(Error::InternalError("read_tls before start".into()));
        }
        self.records.extend(data);
        let result = self.process_records();
        self.check(result)
    }

    /// Take everything queued for the transport.
    pub fn take_outgoing(&mut self) -> Vec<u8> {
        self.outgoing.split().to_vec()
    }

    /// Bytes are waiting for [`take_outgoing`](Self::take_outgoing).
    pub fn has_pending_output(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Encrypt application data, split into records of at most
    /// `max_fragment_length` bytes.
    ///
    /// Returns the number of bytes accepted (all of `data`).
    pub fn write_application_data(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        if !self.state.is_application() {
            return Err(Error::UnexpectedMessage(format!(
                "application data in mode {}",
                self.state.mode()
            )));
        }
        let result = self.emit(&[Command::ApplicationData(data)]);
        self.check(result)?;
        Ok(data.len())
    }

    /// Copy decrypted application data into `buf`.
    ///
    /// Returns the number of bytes copied, zero when nothing is buffered.
    pub fn read_plaintext(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.plaintext.len());
        buf[..n].copy_from_slice(&self.plaintext[..n]);
        self.plaintext.advance(n);
        n
    }

    /// Take all buffered application data.
    pub fn take_plaintext(&mut self) -> Vec<u8> {
        self.plaintext.split().to_vec()
    }

    /// Number of decrypted bytes waiting to be read.
    pub fn plaintext_len(&self) -> usize {
        self.plaintext.len()
    }

    /// The server Finished has been verified.
    pub fn is_handshake_complete(&self) -> bool {
        self.handshake_complete
    }

    /// Application data can still be exchanged.
    pub fn is_open(&self) -> bool {
        !self.closed && self.state.is_application()
    }

    /// The connection has been disposed (error, close, or peer close).
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The server sent close_notify.
    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Begin a graceful close.
    ///
    /// After the handshake this queues close_notify and waits for the
    /// server's reply; during the handshake there is nothing to close
    /// gracefully and the connection is disposed at once.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.state.mode() != HandshakeMode::Application {
            tracing::debug!(mode = %self.state.mode(), "closing without close_notify");
            self.dispose();
            return Ok(());
        }
        let result = self.emit(&[Command::CloseNotify]);
        self.check(result)
    }

    /// Current handshake mode.
    pub fn mode(&self) -> HandshakeMode {
        self.state.mode()
    }

    /// Version chosen by the server.
    pub fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.context.version
    }

    /// Cipher suite chosen by the server.
    pub fn cipher_suite(&self) -> Option<&'static CipherSuite> {
        self.context.cipher_suite
    }

    /// Server certificate chain, leaf first (not validated).
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        &self.context.server_certificates
    }

    /// Connection context (sequence numbers, negotiated parameters).
    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    /// Release key material and cipher states. Idempotent.
    pub fn dispose(&mut self) {
        if !self.closed {
            tracing::debug!(mode = %self.state.mode(), "disposing connection");
        }
        self.context.dispose();
        self.records.clear();
        self.handshake.clear();
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::ConnectionClosed)
        } else {
            Ok(())
        }
    }

    /// Turn an error into a queued fatal alert plus disposal.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if !self.closed {
                tracing::warn!(error = %err, mode = %self.state.mode(), "connection failed");
                if let Some(description) = err.to_alert() {
                    let alert = Alert::fatal(description).encode();
                    if let Err(send_err) = self.write_record(ContentType::Alert, &alert) {
                        tracing::debug!(error = %send_err, "could not queue fatal alert");
                    }
                }
                self.dispose();
            }
        }
        result
    }

    fn record_version(&self) -> ProtocolVersion {
        self.context.version.unwrap_or(self.context.min_version)
    }

    /// Append one or more records of `content_type` carrying `data`,
    /// protected if write protection is active.
    fn write_record(&mut self, content_type: ContentType, data: &[u8]) -> Result<()> {
        self.write_records(content_type, data, MAX_FRAGMENT_SIZE)
    }

    fn write_records(
        &mut self,
        content_type: ContentType,
        data: &[u8],
        chunk_size: usize,
    ) -> Result<()> {
        let version = self.record_version();
        let mut out = Emitter::with_capacity(data.len() + 64);
        for chunk in data.chunks(chunk_size.max(1)) {
            let fragment = match self.context.write_protection.as_mut() {
                Some(protection) => protection.encrypt(&*self.provider, content_type, chunk)?,
                None => chunk.to_vec(),
            };
            TlsPlaintext::new(content_type, version, fragment).encode_into(&mut out)?;
        }
        self.outgoing.extend_from_slice(out.as_slice());
        Ok(())
    }

    /// Encode a handshake message, record it in the transcript and queue it.
    fn write_handshake<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut Emitter) -> Result<()>,
    {
        let mut msg = Emitter::new();
        encode(&mut msg)?;
        self.context.transcript.update(msg.as_slice());
        self.write_record(ContentType::Handshake, msg.as_slice())
    }

    fn emit(&mut self, commands: &[Command<'_>]) -> Result<()> {
        for command in commands {
            tracing::trace!(?command, "emit");
            match *command {
                Command::ClientHello => self.send_client_hello()?,
                Command::ClientKeyExchange => self.send_client_key_exchange()?,
                Command::ChangeCipherSpec => self.send_change_cipher_spec()?,
                Command::Finished => self.send_finished()?,
                Command::ApplicationData(data) => {
                    let chunk_size = self.config.max_fragment_length;
                    for chunk in data.chunks(chunk_size.max(1)) {
                        self.state.advance(Direction::Write, HandshakeMode::Application)?;
                        self.write_records(ContentType::ApplicationData, chunk, chunk_size)?;
                    }
                },
                Command::CloseNotify => {
                    self.state.advance(Direction::Write, HandshakeMode::Alert)?;
                    self.write_record(ContentType::Alert, &Alert::close_notify().encode())?;
                    self.state.advance(Direction::Write, HandshakeMode::CloseNotify)?;
                    tracing::info!("sent close_notify");
                },
            }
        }
        Ok(())
    }

    fn send_client_hello(&mut self) -> Result<()> {
        let mut random = [0u8; RANDOM_SIZE];
        self.provider.random().fill(&mut random)?;
        self.context.client_random = random;

        let mut hello = ClientHello::new(
            self.context.max_version,
            random,
            self.config.cipher_suites.clone(),
        );
        if let Some(host) = &self.config.server_name {
            hello = hello.with_server_name(host)?;
        }

        tracing::debug!(
            max_version = %self.context.max_version,
            suites = hello.cipher_suites.len(),
            sni = ?self.config.server_name,
            "sending ClientHello"
        );
        self.write_handshake(|out| hello.encode(out))
    }

    fn negotiated(&self) -> Result<(&'static CipherSuite, ProtocolVersion)> {
        match (self.context.cipher_suite, self.context.version) {
            (Some(suite), Some(version)) => Ok((suite, version)),
            _ => Err(Error::InternalError("no negotiated parameters".into())),
        }
    }

    fn send_client_key_exchange(&mut self) -> Result<()> {
        let (suite, version) = self.negotiated()?;
        self.state.advance(Direction::Write, HandshakeMode::ClientKeyExchange)?;

        let kx = self.provider.key_exchange();
        let (pre_master_secret, exchange_keys) = if suite.key_exchange.is_ephemeral_dh() {
            let dh = self.context.server_dh.as_ref().ok_or_else(|| {
                Error::UnexpectedMessage("DHE suite without ServerKeyExchange".into())
            })?;
            let key_pair = kx.dh_generate_key_pair(&dh.params)?;
            let shared =
                kx.dh_compute_shared_secret(&dh.params, &key_pair.private_key, &dh.public_value)?;
            (shared, key_pair.public_key)
        } else {
            let key = self.context.server_public_key.as_ref().ok_or_else(|| {
                Error::HandshakeFailure("no server RSA key for key transport".into())
            })?;
            let mut pms = Zeroizing::new(vec![0u8; PRE_MASTER_SECRET_LENGTH]);
            pms[..2].copy_from_slice(&self.context.max_version.to_bytes());
            self.provider.random().fill(&mut pms[2..])?;
            let encrypted = kx.rsa_encrypt_pkcs1(key, &pms)?;
            (pms, encrypted)
        };

        let master_secret = prf::compute_master_secret(
            &*self.provider,
            version,
            &pre_master_secret,
            &self.context.client_random,
            &self.context.server_random,
        )?;
        let key_block = prf::compute_key_block(
            &*self.provider,
            version,
            &master_secret,
            &self.context.client_random,
            &self.context.server_random,
            suite.key_block_length(version),
        )?;
        self.context.pending_keys = Some(KeyMaterial::split(&key_block, suite, version)?);
        self.context.pre_master_secret = Some(pre_master_secret);
        self.context.master_secret = Some(master_secret);
        self.context.key_block = Some(key_block);

        tracing::debug!(
            suite = suite.name,
            exchange_len = exchange_keys.len(),
            "sending ClientKeyExchange"
        );
        let cke = ClientKeyExchange::new(exchange_keys);
        self.write_handshake(|out| cke.encode(out))
    }

    fn send_change_cipher_spec(&mut self) -> Result<()> {
        let (suite, version) = self.negotiated()?;
        self.state.advance(Direction::Write, HandshakeMode::ChangeCipherSpec)?;
        self.write_record(ContentType::ChangeCipherSpec, &[1])?;

        let keys = self
            .context
            .pending_keys
            .as_ref()
            .ok_or_else(|| Error::InternalError("no pending keys".into()))?;
        let protection = RecordProtection::new(
            &*self.provider,
            suite,
            version,
            &keys.client_mac_key,
            &keys.client_key,
            &keys.client_iv,
        )?;
        self.context.write_protection = Some(protection);
        tracing::debug!("write protection active");
        Ok(())
    }

    fn send_finished(&mut self) -> Result<()> {
        let (_, version) = self.negotiated()?;
        self.state.advance(Direction::Write, HandshakeMode::Finished)?;
        let verify_data = self.verify_data(version, true)?;
        let finished = Finished::new(verify_data.to_vec());
        tracing::debug!("sending Finished");
        self.write_handshake(|out| finished.encode(out))
    }

    fn verify_data(&self, version: ProtocolVersion, is_client: bool) -> Result<Zeroizing<Vec<u8>>> {
        let master_secret = self
            .context
            .master_secret
            .as_ref()
            .ok_or_else(|| Error::InternalError("no master secret".into()))?;
        let hash = self
            .context
            .transcript
            .finished_hash(&*self.provider, version)?;
        prf::compute_verify_data(&*self.provider, version, master_secret, is_client, &hash)
    }

    fn process_records(&mut self) -> Result<()> {
        while !self.closed {
            let record = match self.records.next_record()? {
                Some(record) => record,
                None => break,
            };
            self.process_record(record)?;
        }
        Ok(())
    }

    fn process_record(&mut self, record: TlsPlaintext) -> Result<()> {
        if let Some(version) = self.context.version {
            if record.version != version {
                return Err(Error::IllegalParameter(format!(
                    "record version {} after negotiating {}",
                    record.version, version
                )));
            }
        }

        let content_type = record.content_type;
        let fragment = match self.context.read_protection.as_mut() {
            Some(protection) => {
                protection.decrypt(&*self.provider, content_type, &record.fragment)?
            },
            None => record.fragment,
        };

        if content_type != ContentType::Handshake && !self.handshake.is_empty() {
            return Err(Error::UnexpectedMessage(
                "record interleaved with a fragmented handshake message".into(),
            ));
        }

        match content_type {
            ContentType::Handshake => {
                if fragment.is_empty() {
                    return Err(Error::InvalidMessage("empty handshake record".into()));
                }
                self.handshake.extend(&fragment);
                while let Some(message) = self.handshake.next_message()? {
                    self.process_handshake(message)?;
                    if self.closed {
                        break;
                    }
                }
                Ok(())
            },
            ContentType::ChangeCipherSpec => self.process_change_cipher_spec(&fragment),
            ContentType::Alert => self.process_alert(&fragment),
            ContentType::ApplicationData => {
                self.state.advance(Direction::Read, HandshakeMode::Application)?;
                if !self.handshake_complete {
                    return Err(Error::UnexpectedMessage(
                        "application data before Finished".into(),
                    ));
                }
                tracing::trace!(len = fragment.len(), "application data");
                self.plaintext.extend_from_slice(&fragment);
                Ok(())
            },
        }
    }

    fn process_handshake(&mut self, message: RawHandshake) -> Result<()> {
        tracing::debug!(msg_type = ?message.msg_type, len = message.raw.len(), "received handshake message");

        // only ServerKeyExchange depends on the version, and it cannot pass
        // the transition check before ServerHello fixed one
        let version = self.context.version.unwrap_or(self.context.max_version);
        let next = match HandshakeMessage::decode(message.msg_type, message.body(), version)? {
            HandshakeMessage::ServerHello(hello) => {
                self.state.advance(Direction::Read, HandshakeMode::ServerHello)?;
                self.process_server_hello(hello)?;
                HandshakeMode::ServerHello
            },
            HandshakeMessage::Certificate(certificate) => {
                self.state.advance(Direction::Read, HandshakeMode::Certificate)?;
                self.process_certificate(certificate)?;
                HandshakeMode::Certificate
            },
            HandshakeMessage::ServerKeyExchange(ske) => {
                self.state.advance(Direction::Read, HandshakeMode::ServerKeyExchange)?;
                self.process_server_key_exchange(ske)?;
                HandshakeMode::ServerKeyExchange
            },
            HandshakeMessage::ServerHelloDone(_) => {
                self.state.advance(Direction::Read, HandshakeMode::ServerHelloDone)?;
                HandshakeMode::ServerHelloDone
            },
            HandshakeMessage::Finished(finished) => {
                return self.process_server_finished(finished, &message.raw)
            },
            other @ (HandshakeMessage::ClientHello(_) | HandshakeMessage::ClientKeyExchange(_)) => {
                return Err(Error::UnexpectedMessage(format!(
                    "client message {:?} from server",
                    other.handshake_type()
                )))
            },
        };
        self.context.transcript.update(&message.raw);

        if next == HandshakeMode::ServerHelloDone {
            self.process_server_hello_done()?;
        }
        Ok(())
    }

    fn process_server_hello(&mut self, hello: ServerHello) -> Result<()> {
        let version = ProtocolVersion::from_u16(hello.server_version)
            .filter(|v| (self.context.min_version..=self.context.max_version).contains(v))
            .ok_or(Error::UnsupportedVersion(hello.server_version))?;

        if !self.config.cipher_suites.contains(&hello.cipher_suite) {
            return Err(Error::IllegalParameter(format!(
                "server chose suite 0x{:04X} that was not offered",
                hello.cipher_suite
            )));
        }
        let suite = cipher_suites::lookup(hello.cipher_suite)?;
        if !suite.supports_version(version) {
            return Err(Error::IllegalParameter(format!(
                "{} cannot be used with {}",
                suite.name, version
            )));
        }
        if hello.compression_method != 0 {
            return Err(Error::IllegalParameter(format!(
                "compression method {}",
                hello.compression_method
            )));
        }

        self.context.version = Some(version);
        self.context.cipher_suite = Some(suite);
        self.context.server_random = hello.random;
        self.context.session_id = hello.session_id;

        tracing::info!(%version, suite = suite.name, "negotiated");
        Ok(())
    }

    fn process_certificate(&mut self, certificate: Certificate) -> Result<()> {
        let (suite, _) = self.negotiated()?;
        let leaf = certificate
            .leaf()
            .ok_or(Error::ProtocolError(ProtocolError::BadCertificate))?;

        if !suite.key_exchange.is_ephemeral_dh() {
            self.context.server_public_key = Some(certificate::extract_rsa_public_key(leaf)?);
        }
        tracing::debug!(
            chain_len = certificate.certificate_list.len(),
            "server certificate chain (not validated)"
        );
        self.context.server_certificates = certificate.certificate_list;
        Ok(())
    }

    fn process_server_key_exchange(&mut self, ske: ServerKeyExchange) -> Result<()> {
        let (suite, _) = self.negotiated()?;
        if !suite.key_exchange.is_ephemeral_dh() {
            return Err(Error::UnexpectedMessage(format!(
                "ServerKeyExchange with {}",
                suite.name
            )));
        }
        tracing::debug!(
            prime_bits = ske.dh_p.len() * 8,
            "server DH parameters (signature not verified)"
        );
        self.context.server_dh = Some(ServerDhParams {
            params: ske.parameters(),
            public_value: ske.dh_ys,
        });
        Ok(())
    }

    fn process_server_hello_done(&mut self) -> Result<()> {
        let (suite, _) = self.negotiated()?;
        if suite.key_exchange.is_ephemeral_dh() && self.context.server_dh.is_none() {
            return Err(Error::UnexpectedMessage(format!(
                "ServerHelloDone without ServerKeyExchange for {}",
                suite.name
            )));
        }
        self.emit(&[
            Command::ClientKeyExchange,
            Command::ChangeCipherSpec,
            Command::Finished,
        ])
    }

    fn process_change_cipher_spec(&mut self, fragment: &[u8]) -> Result<()> {
        if fragment != [1] {
            return Err(Error::InvalidMessage("malformed ChangeCipherSpec".into()));
        }
        self.state.advance(Direction::Read, HandshakeMode::ChangeCipherSpec)?;

        let (suite, version) = self.negotiated()?;
        let keys = self
            .context
            .pending_keys
            .as_ref()
            .ok_or_else(|| Error::InternalError("no pending keys".into()))?;
        let protection = RecordProtection::new(
            &*self.provider,
            suite,
            version,
            &keys.server_mac_key,
            &keys.server_key,
            &keys.server_iv,
        )?;
        self.context.read_protection = Some(protection);
        self.state.advance(Direction::Read, HandshakeMode::EncryptedHandshake)?;
        tracing::debug!("read protection active");
        Ok(())
    }

    fn process_server_finished(&mut self, finished: Finished, raw: &[u8]) -> Result<()> {
        if self.state.mode() != HandshakeMode::EncryptedHandshake {
            return Err(Error::UnexpectedMessage(format!(
                "Finished in mode {}",
                self.state.mode()
            )));
        }
        let (_, version) = self.negotiated()?;

        let expected = self.verify_data(version, false)?;
        if !bool::from(expected.as_slice().ct_eq(&finished.verify_data)) {
            return Err(Error::VerifyDataMismatch);
        }
        self.context.transcript.update(raw);
        self.state.advance(Direction::Read, HandshakeMode::Application)?;
        self.context.clear_handshake_secrets();
        self.handshake_complete = true;

        tracing::info!(
            version = %version,
            suite = self.context.cipher_suite.map(|s| s.name).unwrap_or("?"),
            "handshake complete"
        );
        Ok(())
    }

    fn process_alert(&mut self, fragment: &[u8]) -> Result<()> {
        let alert = Alert::decode(fragment)?;

        if alert.is_fatal() {
            tracing::error!(alert = %alert.description, "received fatal alert");
            return Err(Error::AlertReceived(alert.description));
        }

        if !alert.is_close_notify() {
            tracing::warn!(alert = %alert.description, "ignoring warning alert");
            return Ok(());
        }

        let initiated_locally = self.state.mode() == HandshakeMode::CloseNotify;
        self.state.advance(Direction::Read, HandshakeMode::Alert)?;
        self.peer_closed = true;

        if initiated_locally {
            tracing::info!("received close_notify reply");
        } else {
            tracing::info!("received close_notify, replying");
            self.write_record(ContentType::Alert, &Alert::close_notify().encode())?;
            self.state.advance(Direction::Write, HandshakeMode::CloseNotify)?;
        }
        self.dispose();
        Ok(())
    }
}
