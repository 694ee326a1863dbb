//! SHA-256 integrity side-car for the data file.
//!
//! After every save the hex digest of the written bytes is stored in
//! `<data file>.<suffix>`. On load the digest is recomputed and compared.
//! The result is informational: a missing or stale digest is reported,
//! never fatal, because the records themselves are validated anyway.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::StoreError;

/// Outcome of comparing the data file with its digest side-car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// The stored digest matches the file.
    Verified,
    /// There is no digest file.
    Missing,
    /// The stored digest does not match the file.
    Mismatch,
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn compute_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `path` with `.<suffix>` appended to its file name.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Compare the file at `path` against `<path>.<suffix>`.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the data file or an existing digest file
/// cannot be read.
pub fn verify_integrity(path: &Path, suffix: &str) -> Result<IntegrityStatus, StoreError> {
    let bytes = std::fs::read(path).map_err(StoreError::io(path))?;
    let digest_path = sibling_path(path, suffix);
    let expected = match std::fs::read_to_string(&digest_path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(IntegrityStatus::Missing),
        Err(e) => {
            return Err(StoreError::Io {
                path: digest_path,
                source: e,
            });
        }
    };
    if expected.trim().eq_ignore_ascii_case(&compute_digest(&bytes)) {
        Ok(IntegrityStatus::Verified)
    } else {
        Ok(IntegrityStatus::Mismatch)
    }
}
