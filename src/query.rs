//! Query engine: admission → cache → retrieval → prompt → inference.
//!
//! Each request terminates in one of three states: answered (possibly from
//! cache), rate limited, or failed on a provider error. Retrieval returning
//! few or no chunks is not a failure — the model is still asked and may
//! answer "I don't know".

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::AnswerCache;
use crate::config::Config;
use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::ServiceError;
use crate::llm::ChatModel;
use crate::ratelimit::RateLimiter;
use crate::store::ChunkStore;

/// Fixed instruction template wrapped around the retrieved context and the
/// user's question.
const PROMPT_TEMPLATE: &str = "You are a helpful assistant for internal system documentation. \
Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know.

Context: {context}

Question: {question}

Answer: ";

pub struct QueryEngine {
    store: Arc<ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn ChatModel>,
    rate_limiter: RateLimiter,
    cache: AnswerCache,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(
        config: &Config,
        store: Arc<ChunkStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            store,
            embeddings,
            llm,
            rate_limiter: RateLimiter::new(&config.rate_limit),
            cache: AnswerCache::new(config.cache.max_entries),
            top_k: config.retrieval.top_k,
        }
    }

    /// Answer `question` on behalf of `user_id`.
    pub async fn answer(&self, question: &str, user_id: &str) -> Result<String, ServiceError> {
        if !self.rate_limiter.is_allowed(user_id) {
            debug!(user = user_id, "query rate limited");
            return Err(ServiceError::RateLimited);
        }

        if let Some(answer) = self.cache.get(question, user_id) {
            debug!(user = user_id, "query answered from cache");
            return Ok(answer);
        }

        let query_vec = embed_query(self.embeddings.as_ref(), question).await?;
        let hits = self.store.query_by_embedding(&query_vec, self.top_k);

        let context = hits
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = build_prompt(&context, question);

        let answer = self.llm.complete(&prompt).await.map_err(|e| {
            warn!(user = user_id, error = %e, "inference failed");
            e
        })?;

        self.cache.put(question, user_id, answer.clone());
        Ok(answer)
    }
}

/// Fill the instruction template with the retrieved context (newline-joined
/// chunk texts in retrieval order) and the question.
fn build_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}
