//! Core data models used throughout ragserve.
//!
//! These types represent the document versions and chunk metadata that flow
//! through the ingestion and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single recorded version of an uploaded document.
///
/// Version numbers are assigned by the [`VersionLedger`](crate::ledger::VersionLedger)
/// and are gapless per filename, starting at 1. Records are immutable once
/// created and are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentVersion {
    pub filename: String,
    pub version: u32,
    /// SHA-256 hex digest of the uploaded bytes. Audit fingerprint only;
    /// re-uploading identical content still produces a new version.
    pub hash: String,
    pub uploaded_by: String,
    pub upload_date: DateTime<Utc>,
}

/// Metadata attached to every chunk entry in the vector store.
///
/// The (filename, version) pair always matches exactly one ledger record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub version: u32,
    pub hash: String,
    pub uploaded_by: String,
    pub upload_date: DateTime<Utc>,
    /// Zero-based position of the chunk within its document version.
    pub chunk_index: usize,
}
