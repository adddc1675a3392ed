//! # ragserve
//!
//! A document ingestion and retrieval-augmented question answering service.
//!
//! Users upload documents over HTTP; ragserve extracts and chunks the text,
//! embeds the chunks through an external provider, stores them in an
//! in-memory vector index with per-document version metadata, and answers
//! natural-language questions by retrieving the nearest chunks and invoking
//! a language model — with per-user rate limiting and a bounded answer cache
//! in front.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────────────────────────┐   ┌──────────────┐
//! │  HTTP   │──▶│  Ingestion Pipeline       │──▶│ Vector Store │
//! │ /upload │   │ extract → chunk → embed  │   │ + Ledger     │
//! └─────────┘   └──────────────────────────┘   └──────┬───────┘
//!                                                     │
//! ┌─────────┐   ┌──────────────────────────┐          │
//! │  HTTP   │──▶│  Query Engine             │◀─────────┘
//! │ /query  │   │ limit → cache → retrieve │──▶ language model
//! └─────────┘   │ → prompt → infer         │
//!               └──────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Service error taxonomy |
//! | [`extract`] | Format-specific text extraction |
//! | [`chunk`] | Overlapping fixed-window chunker |
//! | [`ledger`] | Per-filename version history |
//! | [`store`] | In-memory vector store |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Language-model provider abstraction |
//! | [`ratelimit`] | Sliding-window rate limiter |
//! | [`cache`] | Bounded LRU answer cache |
//! | [`ingest`] | Upload pipeline orchestration |
//! | [`query`] | Query engine orchestration |
//! | [`server`] | HTTP server |

pub mod cache;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod ledger;
pub mod llm;
pub mod models;
pub mod query;
pub mod ratelimit;
pub mod server;
pub mod store;
