//! Benchmark crate for LTLS. See `benches/`.
