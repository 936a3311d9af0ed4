//! Question answering over uploaded documents.
//!
//! - [`Embedder`]: text embeddings for semantic ranking
//! - [`ChunkIndex`]: in-memory retrieval over document chunks
//! - [`RagPipeline`]: retrieval plus LLM completion
//! - [`ConversationSender`]: the chat panel's send handler

mod controller;
mod embedding;
mod index;
mod pipeline;

pub use controller::ConversationSender;
pub use embedding::{Embedder, FastEmbedder, cosine_similarity};
pub use index::{ChunkIndex, SearchHit};
pub use pipeline::{QueryAnswer, RagPipeline};
