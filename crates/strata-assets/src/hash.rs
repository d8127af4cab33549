//! SHA-256 content hashing.
//!
//! Digests double as freshness tokens: an uploaded object changes its token
//! exactly when its bytes change, which keeps synthesis reproducible.

use std::fs::File;
use std::io::{BufReader, copy};
use std::path::Path;

use sha2::{Digest, Sha256};
use strata_common::error::{Result, StrataError};
use strata_common::types::ContentHash;

/// Computes the SHA-256 hash of a byte buffer.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let digest: [u8; 32] = Sha256::digest(bytes).into();
    ContentHash::from_digest(&digest)
}

/// Computes the SHA-256 hash of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    tracing::debug!(path = %path.display(), "computing SHA-256 hash");
    let io_err = |source| StrataError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut hasher = Sha256::new();
    let _ = copy(&mut reader, &mut hasher).map_err(io_err)?;
    let digest: [u8; 32] = hasher.finalize().into();
    Ok(ContentHash::from_digest(&digest))
}

/// Validates that a file matches the expected SHA-256 hash.
///
/// # Errors
///
/// Returns `StrataError::HashMismatch` if the hashes do not match, or an
/// I/O error if the file cannot be read.
pub fn validate_hash(path: &Path, expected: &ContentHash) -> Result<()> {
    tracing::debug!(path = %path.display(), "validating SHA-256 hash");
    let actual = hash_file(path)?;
    if &actual != expected {
        return Err(StrataError::HashMismatch {
            resource: path.display().to_string(),
            expected: expected.as_hex().to_string(),
            actual: actual.as_hex().to_string(),
        });
    }
    Ok(())
}
