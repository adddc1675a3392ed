//! End-to-end scenarios for the ingestion pipeline and query engine, using
//! counting mock providers in place of the external embedding and
//! language-model services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ragserve::config::Config;
use ragserve::embedding::EmbeddingProvider;
use ragserve::error::ServiceError;
use ragserve::ingest::{ingest_document, sha256_hex};
use ragserve::ledger::VersionLedger;
use ragserve::llm::ChatModel;
use ragserve::query::QueryEngine;
use ragserve::store::ChunkStore;

// ============ Mock providers ============

/// Deterministic embeddings: one dimension per test keyword plus a constant,
/// so texts mentioning the same keyword are nearest neighbors.
struct KeywordEmbeddings {
    calls: AtomicUsize,
}

impl KeywordEmbeddings {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let t = text.to_lowercase();
        let dim = |kw: &str| if t.contains(kw) { 1.0 } else { 0.0 };
        vec![dim("alpha"), dim("beta"), 1.0]
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddings {
    fn model_name(&self) -> &str {
        "keyword-mock"
    }
    fn dims(&self) -> usize {
        3
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}

struct FailingEmbeddings;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddings {
    fn model_name(&self) -> &str {
        "failing-mock"
    }
    fn dims(&self) -> usize {
        3
    }
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Err(ServiceError::EmbeddingProvider("provider down".to_string()))
    }
}

/// Chat model returning a fixed answer and recording every prompt it sees.
struct ScriptedChat {
    answer: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn model_name(&self) -> &str {
        "scripted-mock"
    }
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

struct FailingChat;

#[async_trait]
impl ChatModel for FailingChat {
    fn model_name(&self) -> &str {
        "failing-mock"
    }
    async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::InferenceProvider("model down".to_string()))
    }
}

// ============ Fixtures ============

/// Minimal valid PDF containing `phrase`. Builds body then xref with correct
/// byte offsets so pdf-extract can parse it.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET\n", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}endstream endobj\n",
            stream.len(),
            stream
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// Minimal docx (ZIP) whose word/document.xml holds one paragraph per entry.
fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

struct Harness {
    config: Config,
    ledger: VersionLedger,
    store: Arc<ChunkStore>,
    embeddings: Arc<KeywordEmbeddings>,
}

impl Harness {
    fn new(config: Config) -> Self {
        Self {
            config,
            ledger: VersionLedger::new(),
            store: Arc::new(ChunkStore::new()),
            embeddings: Arc::new(KeywordEmbeddings::new()),
        }
    }

    async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
        user: &str,
    ) -> Result<ragserve::models::DocumentVersion, ServiceError> {
        ingest_document(
            &self.config,
            &self.ledger,
            &self.store,
            self.embeddings.as_ref(),
            filename,
            bytes,
            user,
        )
        .await
    }

    fn engine(&self, chat: Arc<dyn ChatModel>) -> QueryEngine {
        QueryEngine::new(&self.config, self.store.clone(), self.embeddings.clone(), chat)
    }
}

// ============ Ingestion scenarios ============

#[tokio::test]
async fn sequential_uploads_get_versions_one_to_n() {
    let h = Harness::new(Config::default());
    for expected in 1..=4u32 {
        let content = format!("Revision {} of the handbook.", expected);
        let v = h
            .upload("handbook.txt", content.as_bytes(), "alice")
            .await
            .unwrap();
        assert_eq!(v.version, expected);
    }
    let history = h.ledger.list_versions("handbook.txt");
    assert_eq!(
        history.iter().map(|v| v.version).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
}

#[tokio::test]
async fn two_user_pdf_upload_scenario() {
    let h = Harness::new(Config::default());

    let content_a = minimal_pdf("leave policy draft A");
    let content_b = minimal_pdf("leave policy draft B");

    let v1 = h.upload("policy.pdf", &content_a, "alice").await.unwrap();
    assert_eq!(v1.version, 1);
    assert_eq!(v1.hash, sha256_hex(&content_a));

    let v2 = h.upload("policy.pdf", &content_b, "bob").await.unwrap();
    assert_eq!(v2.version, 2);

    let history = h.ledger.list_versions("policy.pdf");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].version, 1);
    assert_eq!(history[0].uploaded_by, "alice");
    assert_eq!(history[1].version, 2);
    assert_eq!(history[1].uploaded_by, "bob");
    assert_ne!(history[0].hash, history[1].hash);
}

#[tokio::test]
async fn duplicate_content_still_creates_a_new_version() {
    let h = Harness::new(Config::default());
    let bytes = b"identical bytes";
    let v1 = h.upload("dup.txt", bytes, "alice").await.unwrap();
    let v2 = h.upload("dup.txt", bytes, "alice").await.unwrap();
    assert_eq!(v1.version, 1);
    assert_eq!(v2.version, 2);
    assert_eq!(v1.hash, v2.hash);
}

#[tokio::test]
async fn unsupported_extension_rejected_before_any_write() {
    let h = Harness::new(Config::default());
    let err = h
        .upload("notes.xyz", b"some bytes", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnsupportedFormat(_)));
    assert!(h.store.is_empty());
    assert_eq!(h.ledger.version_count("notes.xyz"), 0);
    assert_eq!(h.embeddings.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn chunk_metadata_is_contiguous_and_matches_ledger() {
    let mut config = Config::default();
    config.chunking.chunk_size = 40;
    config.chunking.chunk_overlap = 10;
    let h = Harness::new(config);

    let text = "The alpha policy covers remote work, travel, and equipment purchases in detail.";
    let record = h.upload("alpha.txt", text.as_bytes(), "alice").await.unwrap();

    let entries = h.store.query_by_filter(|m| m.filename == "alpha.txt");
    assert!(entries.len() > 1);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.metadata.chunk_index, i);
        assert_eq!(entry.metadata.version, record.version);
        assert_eq!(entry.metadata.hash, record.hash);
        assert_eq!(entry.metadata.uploaded_by, "alice");
        assert_eq!(entry.metadata.upload_date, record.upload_date);
        assert_eq!(entry.embedding.len(), 3);
    }
}

#[tokio::test]
async fn docx_upload_is_searchable() {
    let h = Harness::new(Config::default());
    let bytes = minimal_docx(&["The alpha rollout starts Monday.", "Contact the platform team."]);
    h.upload("rollout.docx", &bytes, "alice").await.unwrap();

    let query_vec = KeywordEmbeddings::embed_one("alpha");
    let hits = h.store.query_by_embedding(&query_vec, 1);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].text.contains("alpha rollout"));
}

#[tokio::test]
async fn embedding_failure_aborts_ingestion_with_no_partial_write() {
    let h = Harness::new(Config::default());
    let err = ingest_document(
        &h.config,
        &h.ledger,
        &h.store,
        &FailingEmbeddings,
        "doc.txt",
        b"some document text",
        "alice",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::EmbeddingProvider(_)));
    assert!(h.store.is_empty());
    assert_eq!(h.ledger.version_count("doc.txt"), 0);
}

// ============ Query scenarios ============

#[tokio::test]
async fn query_retrieves_the_relevant_chunks() {
    let h = Harness::new(Config::default());
    h.upload("alpha.txt", b"The alpha budget is 40000 euros.", "alice")
        .await
        .unwrap();
    h.upload("beta.txt", b"The beta launch is in October.", "alice")
        .await
        .unwrap();

    let chat = Arc::new(ScriptedChat::new("The alpha budget is 40000 euros."));
    let engine = h.engine(chat.clone());

    let answer = engine
        .answer("What is the alpha budget?", "alice")
        .await
        .unwrap();
    assert_eq!(answer, "The alpha budget is 40000 euros.");

    let prompts = chat.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("The alpha budget is 40000 euros."));
    assert!(prompts[0].contains("Question: What is the alpha budget?"));
}

#[tokio::test]
async fn second_identical_query_is_served_from_cache() {
    let h = Harness::new(Config::default());
    h.upload("alpha.txt", b"The alpha budget is 40000 euros.", "alice")
        .await
        .unwrap();

    let chat = Arc::new(ScriptedChat::new("40000 euros."));
    let engine = h.engine(chat.clone());

    let embed_calls_before_queries = h.embeddings.calls.load(Ordering::SeqCst);

    let first = engine.answer("What is the alpha budget?", "alice").await.unwrap();
    let second = engine.answer("What is the alpha budget?", "alice").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    // The cached path skips retrieval too: only the first query embedded.
    assert_eq!(
        h.embeddings.calls.load(Ordering::SeqCst),
        embed_calls_before_queries + 1
    );
}

#[tokio::test]
async fn cache_is_per_user() {
    let h = Harness::new(Config::default());
    let chat = Arc::new(ScriptedChat::new("An answer."));
    let engine = h.engine(chat.clone());

    engine.answer("Same question?", "alice").await.unwrap();
    engine.answer("Same question?", "bob").await.unwrap();
    assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn query_with_no_stored_chunks_still_answers() {
    let h = Harness::new(Config::default());
    let chat = Arc::new(ScriptedChat::new("I don't know."));
    let engine = h.engine(chat.clone());

    let answer = engine
        .answer("What is the leave policy?", "alice")
        .await
        .unwrap();
    assert_eq!(answer, "I don't know.");
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rate_limit_denies_after_budget_exhausted() {
    let mut config = Config::default();
    config.rate_limit.max_requests = 2;
    let h = Harness::new(config);

    let chat = Arc::new(ScriptedChat::new("An answer."));
    let engine = h.engine(chat.clone());

    engine.answer("Question one?", "alice").await.unwrap();
    engine.answer("Question two?", "alice").await.unwrap();
    let err = engine.answer("Question three?", "alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::RateLimited));

    // Other users are unaffected.
    engine.answer("Question one?", "bob").await.unwrap();
}

#[tokio::test]
async fn inference_failure_is_surfaced_and_not_cached() {
    let h = Harness::new(Config::default());
    let engine = h.engine(Arc::new(FailingChat));

    let err = engine.answer("Anything?", "alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::InferenceProvider(_)));

    // A failed answer must not be memoized: the second attempt hits the
    // provider again and fails the same way.
    let err = engine.answer("Anything?", "alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::InferenceProvider(_)));
}
