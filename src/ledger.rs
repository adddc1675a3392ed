//! Version Ledger: per-filename upload history.
//!
//! Owns the ordered sequence of [`DocumentVersion`] records per filename.
//! Version numbers are computed as count + 1 under the ledger lock, and the
//! read-count → write-record span of an ingestion is serialized per filename
//! through [`VersionLedger::upload_guard`], so two concurrent uploads of the
//! same filename can never compute the same next version.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use crate::models::DocumentVersion;

/// Shared, internally locked version ledger. Records are append-only and
/// never deleted.
pub struct VersionLedger {
    versions: Mutex<HashMap<String, Vec<DocumentVersion>>>,
    upload_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self {
            versions: Mutex::new(HashMap::new()),
            upload_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the per-filename upload lock.
    ///
    /// The ingestion pipeline holds this guard from the version-number peek
    /// until the version record is written.
    pub async fn upload_guard(&self, filename: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.upload_locks.lock().unwrap();
            locks
                .entry(filename.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of versions recorded for `filename` (0 for unknown filenames).
    pub fn version_count(&self, filename: &str) -> usize {
        let versions = self.versions.lock().unwrap();
        versions.get(filename).map_or(0, |v| v.len())
    }

    /// Append the next version record for `filename` and return it.
    ///
    /// The version number is count + 1, computed under the ledger lock.
    /// `uploaded_at` is supplied by the caller so the record matches the
    /// `upload_date` already written into the chunk metadata.
    pub fn record_version(
        &self,
        filename: &str,
        hash: &str,
        uploaded_by: &str,
        uploaded_at: DateTime<Utc>,
    ) -> DocumentVersion {
        let mut versions = self.versions.lock().unwrap();
        let history = versions.entry(filename.to_string()).or_default();
        let record = DocumentVersion {
            filename: filename.to_string(),
            version: history.len() as u32 + 1,
            hash: hash.to_string(),
            uploaded_by: uploaded_by.to_string(),
            upload_date: uploaded_at,
        };
        history.push(record.clone());
        record
    }

    /// Ordered version history for `filename`. An unknown filename yields an
    /// empty vector, not an error.
    pub fn list_versions(&self, filename: &str) -> Vec<DocumentVersion> {
        let versions = self.versions.lock().unwrap();
        versions.get(filename).cloned().unwrap_or_default()
    }
}

impl Default for VersionLedger {
    fn default() -> Self {
        Self::new()
    }
}
