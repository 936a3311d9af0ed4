//! Notebook LLM: chat with your documents.
//!
//! An Axum server that stores uploaded documents, answers questions about
//! them with retrieval plus an OpenAI-compatible model, and renders its UI
//! as server-side HTML fragments.
//!
//! # Architecture
//!
//! - **Server**: Axum router, JWT auth, JSON errors
//! - **Chat panel**: message list, composer with image attachment, send handler
//! - **Document panel**: per-type viewer with load state and pagination
//! - **UI**: Leptos SSR + HTMX + Alpine.js
//!
//! # Modules
//!
//! - [`chat`]: Chat panel state, composer, conversations
//! - [`document`]: File types, viewer state, storage, loading
//! - [`rag`]: Chunk index, answering pipeline, chat controller
//! - [`llm`]: Chat Completions client
//! - [`ui`]: Leptos components and page rendering
//! - [`server`]: Router and handlers

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod rag;
pub mod security;
pub mod server;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;

use crate::chat::ConversationStore;
use crate::config::AppConfig;
use crate::document::{DocumentLoader, DocumentStore, ViewerStore};
use crate::llm::LlmClient;
use crate::rag::{ChunkIndex, Embedder, RagPipeline};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chat conversations.
    pub conversations: ConversationStore,
    /// Uploaded documents.
    pub documents: DocumentStore,
    /// Open document viewers.
    pub viewers: ViewerStore,
    /// Chunk extraction and viewer payloads.
    pub loader: Arc<DocumentLoader>,
    /// Retrieval plus completion.
    pub pipeline: Arc<RagPipeline>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conversations", &self.conversations.len())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build empty stores from configuration.
    ///
    /// Without an `embedder`, retrieval ranks by term overlap.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        llm: Arc<dyn LlmClient>,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Self {
        let retrieval = &config.retrieval;
        let mut pipeline = RagPipeline::new(ChunkIndex::new(), llm, retrieval.top_k);
        if let Some(embedder) = embedder {
            pipeline = pipeline.with_embedder(embedder);
        }
        Self {
            conversations: ConversationStore::new(),
            documents: DocumentStore::new(
                config.storage.upload_dir.clone(),
                config.storage.max_upload_bytes,
            ),
            viewers: ViewerStore::new(),
            loader: Arc::new(DocumentLoader::new(retrieval.chunk_size, retrieval.chunk_overlap)),
            pipeline: Arc::new(pipeline),
            config,
        }
    }
}
