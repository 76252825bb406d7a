//! Freshness detection: content-hash (blake3) fingerprints for source documents.

mod hash;

pub use hash::{ContentHash, Fingerprint, FingerprintError, compute_file_hash, fingerprint};
