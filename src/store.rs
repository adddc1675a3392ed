//! In-memory vector store for chunk embeddings.
//!
//! Append-only entries behind a `RwLock`, brute-force cosine similarity for
//! nearest-neighbor queries. This is the chunk collection of the service;
//! version metadata has a different access pattern (exact lookup) and lives
//! in the [`VersionLedger`](crate::ledger::VersionLedger).

use std::sync::RwLock;

use crate::models::ChunkMetadata;

/// One stored chunk: its embedding, original text, and metadata.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Append-only in-memory chunk collection.
pub struct ChunkStore {
    entries: RwLock<Vec<VectorEntry>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Bulk-append entries. Single write-lock acquisition, so the insert is
    /// all-or-nothing with respect to concurrent readers.
    pub fn add(&self, entries: Vec<VectorEntry>) {
        let mut stored = self.entries.write().unwrap();
        stored.extend(entries);
    }

    /// The `k` entries most similar to `query` by cosine similarity,
    /// best first. Ties keep insertion order (stable sort), earliest first.
    pub fn query_by_embedding(&self, query: &[f32], k: usize) -> Vec<VectorEntry> {
        let stored = self.entries.read().unwrap();
        let mut scored: Vec<(f32, &VectorEntry)> = stored
            .iter()
            .map(|e| (cosine_similarity(query, &e.embedding), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored.into_iter().map(|(_, e)| e.clone()).collect()
    }

    /// All entries whose metadata satisfies `predicate`, in insertion order.
    pub fn query_by_filter<F>(&self, predicate: F) -> Vec<VectorEntry>
    where
        F: Fn(&ChunkMetadata) -> bool,
    {
        let stored = self.entries.read().unwrap();
        stored
            .iter()
            .filter(|e| predicate(&e.metadata))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity between two embedding vectors.
///
/// Returns 0.0 for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
