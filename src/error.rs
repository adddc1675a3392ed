//! Service error taxonomy.
//!
//! Every pipeline-internal failure aborts the current request and surfaces
//! as one of these variants; the HTTP layer maps them to status codes in
//! [`server`](crate::server). `RateLimited` is an expected outcome, not a
//! bug. An unknown filename on version lookup is *not* an error (it yields
//! an empty list).

use thiserror::Error;

/// Errors surfaced by the ingestion pipeline and query engine.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Client sent a file with an extension outside the allow-list.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The document content could not be parsed into text.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// The external embedding provider failed or timed out.
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// The external language-model provider failed or timed out.
    #[error("inference provider error: {0}")]
    InferenceProvider(String),

    /// The caller exceeded the per-user sliding-window request budget.
    #[error("too many requests, please try again later")]
    RateLimited,
}
