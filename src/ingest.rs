//! Document ingestion pipeline.
//!
//! One stateless run per upload: hash → version peek → extract → chunk →
//! embed → vector-store write → ledger record. Any failure aborts the whole
//! ingestion with nothing persisted; the two writes happen last, chunks
//! first and the version record second, under the per-filename upload guard.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::chunk::split_text;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::ServiceError;
use crate::extract::extract_text;
use crate::ledger::VersionLedger;
use crate::models::{ChunkMetadata, DocumentVersion};
use crate::store::{ChunkStore, VectorEntry};

/// SHA-256 hex digest of the uploaded bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Ingest one uploaded document and return its new version record.
pub async fn ingest_document(
    config: &Config,
    ledger: &VersionLedger,
    store: &ChunkStore,
    embeddings: &dyn EmbeddingProvider,
    filename: &str,
    bytes: &[u8],
    uploaded_by: &str,
) -> Result<DocumentVersion, ServiceError> {
    let hash = sha256_hex(bytes);

    // Serialize the version-peek → record span per filename so concurrent
    // uploads of the same document cannot claim the same version number.
    let _guard = ledger.upload_guard(filename).await;

    let version = ledger.version_count(filename) as u32 + 1;

    let text = extract_text(filename, bytes)?;
    let chunks = split_text(&text, config.chunking.chunk_size, config.chunking.chunk_overlap);

    let vectors = if chunks.is_empty() {
        Vec::new()
    } else {
        embeddings.embed_batch(&chunks).await?
    };
    if vectors.len() != chunks.len() {
        return Err(ServiceError::EmbeddingProvider(format!(
            "expected {} embeddings, got {}",
            chunks.len(),
            vectors.len()
        )));
    }

    let upload_date = Utc::now();
    let entries: Vec<VectorEntry> = chunks
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(chunk_index, (text, embedding))| VectorEntry {
            embedding,
            text,
            metadata: ChunkMetadata {
                filename: filename.to_string(),
                version,
                hash: hash.clone(),
                uploaded_by: uploaded_by.to_string(),
                upload_date,
                chunk_index,
            },
        })
        .collect();

    let chunk_count = entries.len();

    // Chunks first, version record second: a version record is never
    // observable before its chunks.
    store.add(entries);
    let record = ledger.record_version(filename, &hash, uploaded_by, upload_date);

    info!(
        filename,
        version = record.version,
        user = uploaded_by,
        hash = %record.hash,
        chunks = chunk_count,
        "document ingested"
    );

    Ok(record)
}
