//! # lex-qa
//!
//! Question answering over legislative acts with cited sources.
//!
//! An act is a directory of downloaded files (usually one PDF). The first
//! question asked about an act extracts and chunks its text, embeds the
//! chunks, and builds a per-document vector index that is persisted to a
//! versioned blob; later questions reuse the index. Answers are produced
//! by a language model grounded in the retrieved chunks and are cached
//! keyed by (document, question).
//!
//! ## Pipeline
//!
//! ```text
//! directory ──► loader ──► chunks ──► embedder ──► vectors ──► index
//!                                                                │
//!                  question ──► similarity search ──► top-k chunks
//!                                                                │
//!                              synthesizer (LLM + SOURCES) ◄─────┘
//!                                       │
//!                            answer ──► cache ──► caller
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for data dirs, LLM provider and retry policy
//! - [`error`] - Error taxonomy: load, embedding, corrupt-index, synthesis, initialization, timeout
//! - [`models`] - Shared data types: `Document`, `Chunk`, `Answer`, request/response types
//! - [`loader`] - Directory walking, PDF/text extraction, overlapping chunker
//! - [`llm`] - `Embedder`/`ChatModel` traits, Ollama and OpenAI-compatible implementations,
//!   strict-schema question generation
//! - [`index`] - Per-document vector index: build, atomic save, validated load, cosine search
//! - [`synthesize`] - Prompt construction, grounding contract, SOURCES parsing
//! - [`session`] - Per-document QnA session: build-or-load, answer, persist
//! - [`cache`] - Answer cache keyed by (document id, verbatim question)
//! - [`api`] - Axum handlers for documents, ask and suggested questions
//! - [`state`] - Shared application state and document registry persistence

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod loader;
pub mod models;
pub mod session;
pub mod state;
pub mod synthesize;
