//! HTTP server for upload, query, and version listing.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Multipart document upload; returns the new version record |
//! | `POST` | `/query` | Ask a question; returns the answer string |
//! | `GET`  | `/document/versions/{filename}` | Ordered version history (empty list for unknown) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses use the JSON schema:
//!
//! ```json
//! { "error": { "code": "unsupported_format", "message": "..." } }
//! ```
//!
//! Codes: `unauthorized` (401), `bad_request` (400), `unsupported_format`
//! (400), `rate_limited` (429), `extraction_failed` (500), `embedding_failed`
//! (502), `inference_failed` (502), `internal` (500).
//!
//! # Authentication
//!
//! The verified user identity arrives in the `x-user-id` header, set by the
//! fronting auth layer; requests without it are rejected with 401. Auth
//! itself is an external collaborator.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::ServiceError;
use crate::ingest::ingest_document;
use crate::ledger::VersionLedger;
use crate::llm;
use crate::models::DocumentVersion;
use crate::query::QueryEngine;
use crate::store::ChunkStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    ledger: Arc<VersionLedger>,
    store: Arc<ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    engine: Arc<QueryEngine>,
}

impl AppState {
    /// Assemble the service state around the given providers.
    pub fn new(
        config: Config,
        embeddings: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn llm::ChatModel>,
    ) -> Self {
        let store = Arc::new(ChunkStore::new());
        let engine = Arc::new(QueryEngine::new(
            &config,
            store.clone(),
            embeddings.clone(),
            chat,
        ));
        Self {
            config: Arc::new(config),
            ledger: Arc::new(VersionLedger::new()),
            store,
            embeddings,
            engine,
        }
    }
}

/// Build the router with all routes and the permissive CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/query", post(handle_query))
        .route("/document/versions/{filename}", get(handle_versions))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server and run until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let embeddings: Arc<dyn EmbeddingProvider> =
        Arc::from(embedding::create_provider(&config.embedding)?);
    let chat: Arc<dyn llm::ChatModel> = Arc::from(llm::create_model(&config.llm)?);
    let state = AppState::new(config.clone(), embeddings, chat);

    let app = router(state);

    tracing::info!(bind = %bind_addr, "ragserve listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"unsupported_format"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let (status, code) = match &err {
            ServiceError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "unsupported_format"),
            ServiceError::Extraction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "extraction_failed"),
            ServiceError::EmbeddingProvider(_) => (StatusCode::BAD_GATEWAY, "embedding_failed"),
            ServiceError::InferenceProvider(_) => (StatusCode::BAD_GATEWAY, "inference_failed"),
            ServiceError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

/// The verified user identity set by the fronting auth layer.
fn require_user(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .ok_or_else(|| unauthorized("missing x-user-id header"))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    version_info: DocumentVersion,
}

async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let user = require_user(&headers)?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(|f| f.to_string())
                .ok_or_else(|| bad_request("file field has no filename"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(e.to_string()))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| bad_request("multipart field 'file' is required"))?;

    let record = ingest_document(
        &state.config,
        &state.ledger,
        &state.store,
        state.embeddings.as_ref(),
        &filename,
        &bytes,
        &user,
    )
    .await
    .map_err(|e| {
        warn!(filename = %filename, user = %user, error = %e, "upload failed");
        AppError::from(e)
    })?;

    Ok(Json(UploadResponse {
        message: "Document processed successfully".to_string(),
        version_info: record,
    }))
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
}

async fn handle_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let user = require_user(&headers)?;

    if req.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let answer = state.engine.answer(&req.question, &user).await?;
    Ok(Json(QueryResponse { answer }))
}

// ============ GET /document/versions/{filename} ============

#[derive(Serialize)]
struct VersionsResponse {
    versions: Vec<DocumentVersion>,
}

async fn handle_versions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<Json<VersionsResponse>, AppError> {
    require_user(&headers)?;

    // Unknown filenames are an empty history, not a 404.
    Ok(Json(VersionsResponse {
        versions: state.ledger.list_versions(&filename),
    }))
}
