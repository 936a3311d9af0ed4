//! Text embeddings for semantic retrieval.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;
use tracing::info;

/// Turns texts into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts`, one vector per input, in order.
    async fn embed(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Local BGE-small embeddings via `fastembed`.
///
/// The model is loaded by [`FastEmbedder::initialize`]; embedding before
/// that is an error.
pub struct FastEmbedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model", &"BGESmallENV15")
            .finish_non_exhaustive()
    }
}

impl Default for FastEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl FastEmbedder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: Arc::new(Mutex::new(None)),
        }
    }

    /// Load (and on first use download) the model.
    pub async fn initialize(&self) -> anyhow::Result<()> {
        let mut guard = self.model.lock().await;
        if guard.is_none() {
            info!("Initializing fastembed model (BGE-Small-En-V1.5)...");
            let model = tokio::task::spawn_blocking(|| {
                let mut options = InitOptions::new(EmbeddingModel::BGESmallENV15);
                options.show_download_progress = false;
                TextEmbedding::try_new(options)
            })
            .await??;
            *guard = Some(model);
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut guard = self.model.lock().await;
        let mut model = guard.take().context("Embedding model not initialized")?;

        // The model moves into the blocking task and comes back with the result
        let (result, model) = tokio::task::spawn_blocking(move || {
            let result = model.embed(texts, None);
            (result, model)
        })
        .await?;

        *guard = Some(model);
        result.map_err(|e| anyhow::anyhow!(e))
    }
}

/// Cosine similarity; zero when either vector has no length.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_uninitialized_embedder_errors() {
        let embedder = FastEmbedder::new();
        assert!(embedder.embed(vec!["text".to_string()]).await.is_err());
        assert!(embedder.embed(Vec::new()).await.unwrap().is_empty());
    }
}
