//! Content hashing using blake3.
//!
//! A source is considered changed only when its content fingerprint changes,
//! so editors that rewrite identical bytes or merely touch timestamps do not
//! trigger exports.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::SystemTime;

use thiserror::Error;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Convert to hex string (for debugging/display).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Content fingerprint of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub hash: ContentHash,
    pub len: u64,
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hash, self.len)
    }
}

/// Why a fingerprint could not be taken right now.
///
/// Every variant is transient: the file is looked at again on the next scan.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    #[error("file is empty")]
    Empty,

    #[error("file changed while being read")]
    Unstable,
}

/// Compute blake3 hash of file contents.
pub fn compute_file_hash(path: &Path) -> io::Result<ContentHash> {
    let file = File::open(path)?;

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Take a stable fingerprint of `path`.
///
/// Length and mtime must be identical before and after hashing; a writer
/// that is still busy with the file makes this fail with
/// [`FingerprintError::Unstable`]. Zero-length files are treated as
/// mid-write as well: editors truncate before writing.
pub fn fingerprint(path: &Path) -> Result<Fingerprint, FingerprintError> {
    let before = stat(path)?;
    if before.0 == 0 {
        return Err(FingerprintError::Empty);
    }

    let hash = compute_file_hash(path)?;

    let after = stat(path)?;
    if before != after {
        return Err(FingerprintError::Unstable);
    }

    Ok(Fingerprint {
        hash,
        len: before.0,
    })
}

fn stat(path: &Path) -> io::Result<(u64, Option<SystemTime>)> {
    let meta = fs::metadata(path)?;
    Ok((meta.len(), meta.modified().ok()))
}
