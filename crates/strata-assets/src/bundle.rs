//! Function archive locator.

use std::path::Path;

use strata_common::error::{Result, StrataError};
use strata_common::types::{ContentHash, FunctionBundle};

use crate::hash::{hash_file, validate_hash};

/// Builds the bundle locator for a prebuilt function archive.
///
/// The archive is hashed unless `expected` is given, in which case the
/// archive must match it.
///
/// # Errors
///
/// Returns `StrataError::HashMismatch` if the archive disagrees with
/// `expected`, or an I/O error if it cannot be read.
pub fn load_bundle(archive: &Path, expected: Option<&ContentHash>) -> Result<FunctionBundle> {
    let archive_path = std::path::absolute(archive).map_err(|source| StrataError::Io {
        path: archive.to_path_buf(),
        source,
    })?;

    let content_hash = match expected {
        Some(hash) => {
            validate_hash(&archive_path, hash)?;
            hash.clone()
        }
        None => hash_file(&archive_path)?,
    };
    tracing::info!(archive = %archive_path.display(), hash = %content_hash, "function bundle ready");
    Ok(FunctionBundle {
        archive_path,
        content_hash,
    })
}
