//! The authoritative JSON data file.
//!
//! The whole registry is one pretty-printed JSON array. Every save rewrites
//! the file in full:
//!
//! 1. every lot is validated and ids are checked for uniqueness (nothing on
//!    disk is touched if this fails);
//! 2. the current file, if any, is copied to a timestamped backup and old
//!    backups beyond the retention limit are removed;
//! 3. the new content is written to `<path>.tmp`, synced and renamed over
//!    `<path>`, so the data file is always either the old or the new
//!    version;
//! 4. the SHA-256 of the written bytes goes to the digest side-car. The
//!    data file is already in place at this point, so a side-car failure
//!    is logged and reported in [`SaveOutcome::digest_written`] instead of
//!    failing the save.
//!
//! Saves are not synchronized: callers must not save the same path from
//! two threads at once.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use agritrace_core::config::StorageConfig;
use agritrace_core::record::{validate_lot, validate_lot_record};
use agritrace_types::Lot;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::integrity::{IntegrityStatus, compute_digest, sibling_path, verify_integrity};

/// Default number of backups kept next to the data file.
pub const DEFAULT_MAX_BACKUPS: usize = 3;

/// UTC timestamp embedded in backup names. Sorts lexicographically by time.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%6f";

/// Where and how the data file is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path of the data file.
    pub path: PathBuf,
    /// Backups to keep after each save.
    pub max_backups: usize,
    /// Extension of backup files.
    pub backup_suffix: String,
    /// Extension of the digest side-car.
    pub digest_suffix: String,
}

impl StoreConfig {
    /// Defaults for everything but the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_backups: DEFAULT_MAX_BACKUPS,
            backup_suffix: "bak".to_owned(),
            digest_suffix: "sha256".to_owned(),
        }
    }

    /// Set the backup retention limit.
    #[must_use]
    pub const fn with_max_backups(mut self, max: usize) -> Self {
        self.max_backups = max;
        self
    }
}

impl From<&StorageConfig> for StoreConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            path: config.data_path.clone(),
            max_backups: config.max_backups,
            backup_suffix: config.backup_suffix.clone(),
            digest_suffix: config.digest_suffix.clone(),
        }
    }
}

/// What a successful save did besides writing the data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Number of lots written.
    pub lots_written: usize,
    /// Backup of the previous content, if there was a previous file.
    pub backup_path: Option<PathBuf>,
    /// Old backups removed by rotation.
    pub evicted: Vec<PathBuf>,
    /// Old backups that should have been removed but could not be.
    pub eviction_failures: usize,
    /// Hex SHA-256 of the written file.
    pub digest: String,
    /// Whether the digest side-car now holds `digest`.
    pub digest_written: bool,
}

/// Loads and saves the lot collection.
#[derive(Debug, Clone)]
pub struct LotStore {
    config: StoreConfig,
}

impl LotStore {
    /// Create a store over the configured path. Nothing is read yet.
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The store configuration.
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Load and validate every lot in the data file.
    ///
    /// A missing file is an empty collection. Integrity of the digest
    /// side-car is checked and logged but never fails the load.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Io`] if the file exists but cannot be read.
    /// - [`StoreError::Json`] if it is not valid JSON.
    /// - [`StoreError::Format`] if the root is not an array.
    /// - [`StoreError::Validation`] if any record is invalid.
    /// - [`StoreError::DuplicateId`] if two records share an id.
    pub fn load_validated(&self) -> Result<Vec<Lot>, StoreError> {
        let path = self.path();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Data file does not exist, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io(path)(e)),
        };

        let root: Value = serde_json::from_str(&text)?;
        let records = root
            .as_array()
            .ok_or_else(|| StoreError::Format("root must be a JSON array of lots".to_owned()))?;

        let lots = records
            .iter()
            .map(validate_lot_record)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique_ids(&lots)?;

        let integrity = match verify_integrity(path, &self.config.digest_suffix) {
            Ok(IntegrityStatus::Verified) => "verified",
            Ok(IntegrityStatus::Missing) => {
                warn!(path = %path.display(), "No integrity digest for data file");
                "missing"
            }
            Ok(IntegrityStatus::Mismatch) => {
                warn!(
                    path = %path.display(),
                    "Data file does not match its integrity digest"
                );
                "mismatch"
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Integrity check failed");
                "unchecked"
            }
        };

        info!(
            path = %path.display(),
            lots = lots.len(),
            integrity,
            "Data file loaded"
        );
        Ok(lots)
    }

    /// Validate and durably write the whole collection.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] or [`StoreError::DuplicateId`] before
    ///   anything on disk changes.
    /// - [`StoreError::Io`] if the backup, the temp file or the rename fails.
    ///   A failure to write the digest side-car is not an error.
    /// - [`StoreError::Json`] if serialization fails.
    pub fn save_atomic(&self, lots: &[Lot]) -> Result<SaveOutcome, StoreError> {
        for lot in lots {
            validate_lot(lot)?;
        }
        ensure_unique_ids(lots)?;

        let path = self.path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
        }

        let backup_path = self.create_backup()?;
        let (evicted, eviction_failures) = self.evict_old_backups();

        let mut content = serde_json::to_vec_pretty(lots)?;
        content.push(b'\n');
        write_atomic(path, &content)?;

        let digest = compute_digest(&content);
        let digest_written = self.write_digest(&digest);

        info!(
            path = %path.display(),
            lots = lots.len(),
            backup = backup_path.as_ref().map(|p| p.display().to_string()),
            digest_written,
            "Data file saved"
        );

        Ok(SaveOutcome {
            lots_written: lots.len(),
            backup_path,
            evicted,
            eviction_failures,
            digest,
            digest_written,
        })
    }

    /// Write the side-car for `digest`. On failure any stale side-car is
    /// removed so the next load reports it missing rather than mismatched.
    fn write_digest(&self, digest: &str) -> bool {
        let digest_path = sibling_path(self.path(), &self.config.digest_suffix);
        match write_atomic(&digest_path, format!("{digest}\n").as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not write integrity digest, data file is saved");
                if digest_path.is_file() {
                    let _ = std::fs::remove_file(&digest_path);
                }
                false
            }
        }
    }

    /// Existing backups of the data file, oldest first.
    ///
    /// A backup is named `<file>.<timestamp>.<backup_suffix>` with a
    /// non-empty timestamp, so the digest side-car never matches even when
    /// both suffixes are equal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be listed.
    pub fn backups(&self) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.directory();
        let Some(base) = self.path().file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let prefix = format!("{base}.");
        let suffix = format!(".{}", self.config.backup_suffix);

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir)(e)),
        };

        let mut backups: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix(&prefix))
                    .and_then(|rest| rest.strip_suffix(&suffix))
                    .is_some_and(|stamp| !stamp.is_empty())
            })
            .map(|e| e.path())
            .collect();
        backups.sort();
        Ok(backups)
    }

    fn directory(&self) -> PathBuf {
        self.path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Copy the current data file to a timestamped backup.
    fn create_backup(&self) -> Result<Option<PathBuf>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup = sibling_path(path, &format!("{timestamp}.{}", self.config.backup_suffix));
        std::fs::copy(path, &backup).map_err(StoreError::io(&backup))?;
        debug!(source = %path.display(), backup = %backup.display(), "Backup created");
        Ok(Some(backup))
    }

    /// Remove the oldest backups beyond the retention limit.
    ///
    /// Failures are logged and counted, never propagated: losing an old
    /// backup must not block saving new data.
    fn evict_old_backups(&self) -> (Vec<PathBuf>, usize) {
        let backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                warn!(error = %e, "Could not list backups for rotation");
                return (Vec::new(), 0);
            }
        };

        let excess = backups.len().saturating_sub(self.config.max_backups);
        let mut evicted = Vec::new();
        let mut failures: usize = 0;
        for old in backups.into_iter().take(excess) {
            match std::fs::remove_file(&old) {
                Ok(()) => {
                    debug!(backup = %old.display(), "Old backup removed");
                    evicted.push(old);
                }
                Err(e) => {
                    warn!(backup = %old.display(), error = %e, "Failed to remove old backup");
                    failures = failures.saturating_add(1);
                }
            }
        }
        (evicted, failures)
    }
}

/// Write `content` to `<path>.tmp`, sync it, then rename it over `path`.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let temp_path = sibling_path(path, "tmp");

    let result = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        })
        .map_err(StoreError::io(&temp_path))
        .and_then(|()| std::fs::rename(&temp_path, path).map_err(StoreError::io(path)));

    if result.is_err() {
        // Best effort; the temp file may not exist.
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

fn ensure_unique_ids(lots: &[Lot]) -> Result<(), StoreError> {
    let mut seen = BTreeSet::new();
    match lots.iter().find(|l| !seen.insert(l.id)) {
        Some(dup) => Err(StoreError::DuplicateId(dup.id)),
        None => Ok(()),
    }
}
