//! In-memory TLS 1.0-1.2 server for integration tests.
//!
//! The server is built from the same codec, PRF and record layer pieces
//! the client uses, plus a raw RSA private key operation. It is
//! strict: any deviation from the expected flight panics, so
//! a passing test means the client produced exactly the right bytes.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use ltls_core::alert::Alert;
use ltls_core::cipher_suites::{self, CipherSuite};
use ltls_core::codec::Emitter;
use ltls_core::key_block::KeyMaterial;
use ltls_core::messages::{
    Certificate, ClientHello, ClientKeyExchange, Finished, HandshakeBuffer, RawHandshake,
    ServerHello, ServerHelloDone, ServerKeyExchange, SignatureAndHashAlgorithm,
};
use ltls_core::prf;
use ltls_core::protocol::{ContentType, HandshakeType, ProtocolVersion};
use ltls_core::record::{RecordBuffer, TlsPlaintext, MAX_FRAGMENT_SIZE};
use ltls_core::record_protection::RecordProtection;
use ltls_core::transcript::Transcript;
use ltls_core::{ClientConnection, Config};
use ltls_crypto::{CryptoProvider, DhKeyPair, DhParameters};
use ltls_crypto_rustcrypto::RustCryptoProvider;
use num_bigint::BigUint;
use zeroize::Zeroizing;

/// 1024-bit RSA modulus, e = 65537.
pub const RSA_N: &str = "cdfa9a5922778614d1a0b14ce4cfbc5fc84575f8c868b88b0478bc25b4dfe9329048879616a51ad573674326612ece2c147d9802086078522e13931b43171796a85a328783324886f05d9272e3e79a2255613fe9b9c2e4a24178be9b2f5d0aa179f75c64b5a9a8890cbba99914604e446a7efd1b0a8699f11c2a8dad03b57b23";

/// Private exponent matching [`RSA_N`].
pub const RSA_D: &str = "8b5a09e657cd2927189370a02704ebda99317518b4ed343cc8efadca8cce17849fdc91ee56afa8b1d3fb7e908e9b0ddd0097dfa93065a3c1656ed4cd52dc6295d0b1df9594b9269eecbe320b31255a66103f95e580e9ef72b14773263a7e3c70ef9b2346a0720f0ca2c861d70d68883801d3a7a83280c05acc9546e4863f1de1";

/// 768-bit DH prime, g = 2.
pub const DH_P: &str = "cae4d363abcca41fa724cdb5f638823e3f09ea4e091aceb78b8798a9f4aecca68e7be423dad1bbeb29793d6a486a14e77fc79bd98932275f9ca5d2433be625dc1bc9d1ed27fb35c4fc1a0ebfa2ca95e7fdc5911737c4ec34ff97bbf7e45fb58d";

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn provider() -> std::sync::Arc<dyn CryptoProvider> {
    std::sync::Arc::new(RustCryptoProvider::new())
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    match content.len() {
        len @ 0..=0x7F => out.push(len as u8),
        len @ 0x80..=0xFF => out.extend_from_slice(&[0x81, len as u8]),
        len => out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]),
    }
    out.extend_from_slice(content);
    out
}

/// Minimal v3 certificate carrying the test RSA key.
pub fn rsa_certificate() -> Vec<u8> {
    let mut n = vec![0x00];
    n.extend(hex::decode(RSA_N).unwrap());
    let rsa_key = tlv(0x30, &[tlv(0x02, &n), tlv(0x02, &[0x01, 0x00, 0x01])].concat());
    let mut bits = vec![0x00];
    bits.extend_from_slice(&rsa_key);

    let rsa_encryption = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
    let sha256_with_rsa = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];
    let key_algorithm = tlv(0x30, &[tlv(0x06, &rsa_encryption), tlv(0x05, &[])].concat());
    let sig_algorithm = tlv(0x30, &[tlv(0x06, &sha256_with_rsa), tlv(0x05, &[])].concat());
    let spki = tlv(0x30, &[key_algorithm, tlv(0x03, &bits)].concat());
    let cn = tlv(0x30, &[tlv(0x06, &[0x55, 0x04, 0x03]), tlv(0x0C, b"localhost")].concat());
    let name = tlv(0x30, &tlv(0x31, &cn));
    let validity = tlv(
        0x30,
        &[tlv(0x17, b"200101000000Z"), tlv(0x17, b"400101000000Z")].concat(),
    );

    let tbs = [
        tlv(0xA0, &tlv(0x02, &[0x02])),
        tlv(0x02, &[0x10, 0x01]),
        sig_algorithm.clone(),
        name.clone(),
        validity,
        name,
        spki,
    ]
    .concat();

    let mut signature = vec![0x00];
    signature.extend_from_slice(&[0x5A; 128]);
    tlv(
        0x30,
        &[tlv(0x30, &tbs), sig_algorithm, tlv(0x03, &signature)].concat(),
    )
}

/// Raw RSA decryption plus PKCS#1 v1.5 unpadding.
fn rsa_decrypt(ciphertext: &[u8]) -> Vec<u8> {
    let n = BigUint::from_bytes_be(&hex::decode(RSA_N).unwrap());
    let d = BigUint::from_bytes_be(&hex::decode(RSA_D).unwrap());
    // to_bytes_be drops the leading 0x00 of the encoded message
    let em = BigUint::from_bytes_be(ciphertext).modpow(&d, &n).to_bytes_be();
    assert_eq!(em[0], 0x02, "bad PKCS#1 block type");
    let separator = em[1..].iter().position(|&b| b == 0).expect("no PKCS#1 separator") + 1;
    assert!(separator >= 9, "PKCS#1 padding too short");
    em[separator + 1..].to_vec()
}

/// How the test server behaves.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Version written into ServerHello and every record
    pub version: ProtocolVersion,
    /// Suite written into ServerHello, offered or not
    pub suite: u16,
    /// Split the first flight into records of at most this many bytes
    pub handshake_fragment: usize,
    /// Echo application data back
    pub echo: bool,
    /// Flip a bit in the server Finished
    pub corrupt_finished: bool,
}

impl ServerOptions {
    pub fn new(version: ProtocolVersion, suite: u16) -> Self {
        Self {
            version,
            suite,
            handshake_fragment: MAX_FRAGMENT_SIZE,
            echo: true,
            corrupt_finished: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ClientHello,
    ClientKeyExchange,
    ChangeCipherSpec,
    Finished,
    Application,
    Closed,
}

/// Server half of an in-memory connection.
pub struct TestServer {
    provider: RustCryptoProvider,
    options: ServerOptions,
    suite: &'static CipherSuite,
    phase: Phase,
    records: RecordBuffer,
    handshake: HandshakeBuffer,
    transcript: Transcript,
    client_random: [u8; 32],
    server_random: [u8; 32],
    dh: Option<(DhParameters, DhKeyPair)>,
    master_secret: Option<Zeroizing<Vec<u8>>>,
    keys: Option<KeyMaterial>,
    read: Option<RecordProtection>,
    write: Option<RecordProtection>,
    sent_close: bool,

    /// SNI host from ClientHello
    pub server_name: Option<String>,
    /// ClientHello.client_version
    pub client_version: Option<ProtocolVersion>,
    /// ClientHello.cipher_suites
    pub offered_suites: Vec<u16>,
    /// Record version of the first ClientHello record
    pub hello_record_version: Option<ProtocolVersion>,
    /// All decrypted application data
    pub received: Vec<u8>,
    /// Plaintext length of every application data record
    pub record_sizes: Vec<usize>,
    /// Alerts received from the client
    pub alerts: Vec<Alert>,
}

impl TestServer {
    pub fn new(options: ServerOptions) -> Self {
        let suite = cipher_suites::lookup(options.suite).expect("test suite must be registered");
        Self {
            provider: RustCryptoProvider::new(),
            options,
            suite,
            phase: Phase::ClientHello,
            records: RecordBuffer::new(),
            handshake: HandshakeBuffer::new(),
            transcript: Transcript::new(),
            client_random: [0; 32],
            server_random: [0; 32],
            dh: None,
            master_secret: None,
            keys: None,
            read: None,
            write: None,
            sent_close: false,
            server_name: None,
            client_version: None,
            offered_suites: Vec::new(),
            hello_record_version: None,
            received: Vec::new(),
            record_sizes: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_established(&self) -> bool {
        self.phase == Phase::Application
    }

    /// Consume client bytes, return the server's reply.
    pub fn feed(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Emitter::new();
        self.records.extend(data);
        while let Some(record) = self.records.next_record().expect("client record") {
            if self.phase == Phase::Closed {
                break;
            }
            if self.hello_record_version.is_none() {
                self.hello_record_version = Some(record.version);
            }
            self.process_record(record, &mut out);
        }
        out.into_vec()
    }

    /// Encrypt application data for the client.
    pub fn send_application_data(&mut self, data: &[u8]) -> Vec<u8> {
        assert_eq!(self.phase, Phase::Application);
        let mut out = Emitter::new();
        for chunk in data.chunks(MAX_FRAGMENT_SIZE) {
            self.write_record(ContentType::ApplicationData, chunk, &mut out);
        }
        out.into_vec()
    }

    /// Send an alert, encrypted once the handshake is done.
    pub fn send_alert(&mut self, alert: Alert) -> Vec<u8> {
        let mut out = Emitter::new();
        self.write_record(ContentType::Alert, &alert.encode(), &mut out);
        if alert.is_close_notify() {
            self.sent_close = true;
        }
        out.into_vec()
    }

    /// Start a graceful close from the server side.
    pub fn close(&mut self) -> Vec<u8> {
        self.send_alert(Alert::close_notify())
    }

    fn write_record(&mut self, content_type: ContentType, data: &[u8], out: &mut Emitter) {
        let fragment = match self.write.as_mut() {
            Some(protection) => protection
                .encrypt(&self.provider, content_type, data)
                .expect("server encrypt"),
            None => data.to_vec(),
        };
        TlsPlaintext::new(content_type, self.options.version, fragment)
            .encode_into(out)
            .unwrap();
    }

    fn process_record(&mut self, record: TlsPlaintext, out: &mut Emitter) {
        let content_type = record.content_type;
        let fragment = match self.read.as_mut() {
            Some(protection) => protection
                .decrypt(&self.provider, content_type, &record.fragment)
                .expect("server decrypt"),
            None => record.fragment,
        };

        match content_type {
            ContentType::Handshake => {
                self.handshake.extend(&fragment);
                while let Some(message) = self.handshake.next_message().expect("handshake") {
                    self.process_handshake(message, out);
                }
            },
            ContentType::ChangeCipherSpec => {
                assert_eq!(fragment, vec![1]);
                assert_eq!(self.phase, Phase::ChangeCipherSpec);
                let keys = self.keys.as_ref().unwrap();
                self.read = Some(
                    RecordProtection::new(
                        &self.provider,
                        self.suite,
                        self.options.version,
                        &keys.client_mac_key,
                        &keys.client_key,
                        &keys.client_iv,
                    )
                    .unwrap(),
                );
                self.phase = Phase::Finished;
            },
            ContentType::Alert => {
                let alert = Alert::decode(&fragment).expect("alert");
                self.alerts.push(alert);
                if alert.is_close_notify() && !self.sent_close {
                    let reply = Alert::close_notify().encode();
                    self.write_record(ContentType::Alert, &reply, out);
                    self.sent_close = true;
                }
                if alert.is_fatal() || alert.is_close_notify() {
                    self.phase = Phase::Closed;
                }
            },
            ContentType::ApplicationData => {
                assert_eq!(self.phase, Phase::Application);
                self.record_sizes.push(fragment.len());
                self.received.extend_from_slice(&fragment);
                if self.options.echo {
                    self.write_record(ContentType::ApplicationData, &fragment, out);
                }
            },
        }
    }

    fn process_handshake(&mut self, message: RawHandshake, out: &mut Emitter) {
        match message.msg_type {
            HandshakeType::ClientHello => {
                assert_eq!(self.phase, Phase::ClientHello);
                let hello = ClientHello::decode(message.body()).unwrap();
                self.transcript.update(&message.raw);
                self.server_name = hello.server_name();
                self.client_version = Some(hello.client_version);
                self.offered_suites = hello.cipher_suites.clone();
                self.client_random = hello.random;
                self.send_first_flight(out);
                self.phase = Phase::ClientKeyExchange;
            },
            HandshakeType::ClientKeyExchange => {
                assert_eq!(self.phase, Phase::ClientKeyExchange);
                let cke = ClientKeyExchange::decode(message.body()).unwrap();
                self.transcript.update(&message.raw);
                self.derive_keys(&cke.exchange_keys);
                self.phase = Phase::ChangeCipherSpec;
            },
            HandshakeType::Finished => {
                assert_eq!(self.phase, Phase::Finished);
                let finished = Finished::decode(message.body()).unwrap();
                let version = self.options.version;
                let master_secret = self.master_secret.clone().unwrap();

                let hash = self.transcript.finished_hash(&self.provider, version).unwrap();
                let expected =
                    prf::compute_verify_data(&self.provider, version, &master_secret, true, &hash)
                        .unwrap();
                assert_eq!(finished.verify_data, expected.to_vec(), "client Finished mismatch");
                self.transcript.update(&message.raw);

                self.write_record(ContentType::ChangeCipherSpec, &[1], out);
                let keys = self.keys.as_ref().unwrap();
                self.write = Some(
                    RecordProtection::new(
                        &self.provider,
                        self.suite,
                        version,
                        &keys.server_mac_key,
                        &keys.server_key,
                        &keys.server_iv,
                    )
                    .unwrap(),
                );

                let hash = self.transcript.finished_hash(&self.provider, version).unwrap();
                let mut verify_data =
                    prf::compute_verify_data(&self.provider, version, &master_secret, false, &hash)
                        .unwrap()
                        .to_vec();
                if self.options.corrupt_finished {
                    verify_data[0] ^= 0x01;
                }
                let mut msg = Emitter::new();
                Finished::new(verify_data).encode(&mut msg).unwrap();
                self.transcript.update(msg.as_slice());
                self.write_record(ContentType::Handshake, msg.as_slice(), out);
                self.phase = Phase::Application;
            },
            other => panic!("server received {:?}", other),
        }
    }

    fn send_first_flight(&mut self, out: &mut Emitter) {
        let version = self.options.version;
        self.provider.random().fill(&mut self.server_random).unwrap();

        let mut flight = Emitter::new();
        ServerHello::new(version.to_u16(), self.server_random, vec![0x42; 32], self.suite.id)
            .encode(&mut flight)
            .unwrap();
        Certificate::new(vec![rsa_certificate()])
            .encode(&mut flight)
            .unwrap();

        if self.suite.key_exchange.is_ephemeral_dh() {
            let params = DhParameters {
                p: hex::decode(DH_P).unwrap(),
                g: vec![2],
            };
            let key_pair = self
                .provider
                .key_exchange()
                .dh_generate_key_pair(&params)
                .unwrap();
            let algorithm = version.uses_sha256_prf().then(|| SignatureAndHashAlgorithm {
                hash: 4,
                signature: 1,
            });
            ServerKeyExchange {
                dh_p: params.p.clone(),
                dh_g: params.g.clone(),
                dh_ys: key_pair.public_key.clone(),
                algorithm,
                signature: vec![0x5A; 128],
            }
            .encode(&mut flight)
            .unwrap();
            self.dh = Some((params, key_pair));
        }

        ServerHelloDone.encode(&mut flight).unwrap();
        self.transcript.update(flight.as_slice());

        for chunk in flight.as_slice().chunks(self.options.handshake_fragment) {
            self.write_record(ContentType::Handshake, chunk, out);
        }
    }

    fn derive_keys(&mut self, exchange_keys: &[u8]) {
        let version = self.options.version;
        let pre_master_secret = match &self.dh {
            Some((params, key_pair)) => self
                .provider
                .key_exchange()
                .dh_compute_shared_secret(params, &key_pair.private_key, exchange_keys)
                .unwrap(),
            None => {
                let pms = rsa_decrypt(exchange_keys);
                assert_eq!(pms.len(), 48);
                assert_eq!(&pms[..2], &self.client_version.unwrap().to_bytes());
                Zeroizing::new(pms)
            },
        };

        let master_secret = prf::compute_master_secret(
            &self.provider,
            version,
            &pre_master_secret,
            &self.client_random,
            &self.server_random,
        )
        .unwrap();
        let key_block = prf::compute_key_block(
            &self.provider,
            version,
            &master_secret,
            &self.client_random,
            &self.server_random,
            self.suite.key_block_length(version),
        )
        .unwrap();
        self.keys = Some(KeyMaterial::split(&key_block, self.suite, version).unwrap());
        self.master_secret = Some(master_secret);
    }
}

/// Shuttle bytes between client and server until neither has more to say.
pub fn pump(client: &mut ClientConnection, server: &mut TestServer) {
    loop {
        let out = client.take_outgoing();
        if out.is_empty() {
            break;
        }
        let reply = server.feed(&out);
        if !reply.is_empty() && !client.is_closed() {
            client.read_tls(&reply).expect("client read");
        }
    }
}

/// Client and server with a completed handshake.
pub fn connect(config: Config, options: ServerOptions) -> (ClientConnection, TestServer) {
    init_tracing();
    let mut client = ClientConnection::new(config, provider()).expect("client");
    let mut server = TestServer::new(options);
    client.start().expect("start");
    pump(&mut client, &mut server);
    assert!(client.is_handshake_complete());
    assert!(server.is_established());
    (client, server)
}

/// Blocking transport backed by a [`TestServer`].
///
/// Writes are handed to the server immediately; its replies are queued
/// for the next reads. A read with nothing queued returns EOF.
pub struct MemoryTransport {
    pub server: TestServer,
    inbound: VecDeque<u8>,
    /// Largest number of bytes handed out per read
    pub max_read: usize,
}

impl MemoryTransport {
    pub fn new(server: TestServer) -> Self {
        Self {
            server,
            inbound: VecDeque::new(),
            max_read: usize::MAX,
        }
    }

    /// Deliver raw bytes to the client on its next reads.
    pub fn push_inbound(&mut self, data: &[u8]) {
        self.inbound.extend(data);
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbound.len()).min(self.max_read);
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let reply = self.server.feed(buf);
        self.inbound.extend(reply);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
