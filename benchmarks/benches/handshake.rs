//! Handshake performance benchmarks.
//!
//! Measures:
//! - Full handshake against the in-memory test server, per key exchange
//! - ClientHello generation
//! - Master secret and key block derivation for each PRF

#[path = "../../ltls-core/tests/common/mod.rs"]
mod common;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use common::{ServerOptions, TestServer};
use ltls_core::prf;
use ltls_core::protocol::ProtocolVersion;
use ltls_core::{ClientConnection, Config};
use ltls_crypto_rustcrypto::RustCryptoProvider;

/// Full handshake (ClientHello → Finished) for each key exchange.
fn benchmark_full_handshake(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_handshake");
    group.sample_size(20);

    let cases = [
        ("rsa_aes128_sha", ProtocolVersion::Tls12, 0x002F),
        ("rsa_aes256_sha256", ProtocolVersion::Tls12, 0x003D),
        ("dhe_rsa_aes128_sha", ProtocolVersion::Tls12, 0x0033),
        ("rsa_rc4_sha_tls10", ProtocolVersion::Tls10, 0x0005),
    ];

    for (name, version, suite) in cases {
        group.bench_with_input(BenchmarkId::new("full", name), &suite, |b, &suite| {
            b.iter(|| {
                let config = Config::builder().with_cipher_suites(&[suite]).build().unwrap();
                let mut client = ClientConnection::new(config, common::provider()).unwrap();
                let mut server = TestServer::new(ServerOptions::new(version, suite));
                client.start().unwrap();
                common::pump(&mut client, &mut server);
                assert!(client.is_handshake_complete());
                black_box((client, server))
            });
        });
    }

    group.finish();
}

/// ClientHello generation.
fn benchmark_client_hello(c: &mut Criterion) {
    let provider = common::provider();

    c.bench_function("client_hello", |b| {
        b.iter(|| {
            let config = Config::builder()
                .with_server_name("bench.example.com")
                .build()
                .unwrap();
            let mut client = ClientConnection::new(config, provider.clone()).unwrap();
            client.start().unwrap();
            black_box(client.take_outgoing())
        });
    });
}

/// Key schedule: master secret followed by the key block.
fn benchmark_key_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_schedule");
    let provider = RustCryptoProvider::default();
    let pre_master = [0x03u8; 48];
    let client_random = [0x11u8; 32];
    let server_random = [0x22u8; 32];

    for version in [ProtocolVersion::Tls10, ProtocolVersion::Tls12] {
        group.bench_with_input(
            BenchmarkId::new("master_and_key_block", format!("{:?}", version)),
            &version,
            |b, &version| {
                b.iter(|| {
                    let master = prf::compute_master_secret(
                        &provider,
                        version,
                        &pre_master,
                        &client_random,
                        &server_random,
                    )
                    .unwrap();
                    let block = prf::compute_key_block(
                        &provider,
                        version,
                        &master,
                        &client_random,
                        &server_random,
                        136,
                    )
                    .unwrap();
                    black_box(block)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_full_handshake,
    benchmark_client_hello,
    benchmark_key_schedule
);
criterion_main!(benches);
