//! Retrieval-augmented question answering.

use std::sync::Arc;

use serde::Serialize;

use super::embedding::Embedder;
use super::index::{ChunkIndex, SearchHit};
use crate::chat::split_data_url;
use crate::document::{ChunkType, DocumentChunk};
use crate::llm::{LlmClient, Message};

const SYSTEM_PROMPT: &str = "You are an AI assistant helping users understand technical documents. \
Answer questions based on the provided context. If you cannot answer from the context, say so. \
Always cite sources using [doc_id:page] format.";

const SUMMARY_PROMPT: &str = "You summarize documents. Write a concise, factual summary that keeps \
key figures, names, and conclusions.";

/// Upper bound on the text sent in one summarization request.
const SUMMARY_BATCH_CHARS: usize = 8000;

/// Question used when only an image was submitted.
const IMAGE_ONLY_QUESTION: &str = "Describe the attached image.";

/// Answer with the documents it drew on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    /// Model answer.
    pub answer: String,
    /// Document ids of the retrieved context, in rank order, deduplicated.
    pub sources: Vec<String>,
}

/// Retrieval plus completion.
#[derive(Clone)]
pub struct RagPipeline {
    index: ChunkIndex,
    llm: Arc<dyn LlmClient>,
    embedder: Option<Arc<dyn Embedder>>,
    top_k: usize,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("chunks", &self.index.len())
            .field("top_k", &self.top_k)
            .field("semantic", &self.embedder.is_some())
            .finish_non_exhaustive()
    }
}

/// Normalize an image argument to a data URL.
///
/// Bare base64 payloads are assumed to be JPEG.
fn as_data_url(image: &str) -> String {
    if split_data_url(image).is_some() || image.starts_with("http") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{image}")
    }
}

fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("[{}:{}]\n{}", hit.document_id, hit.page_num, hit.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn unique_sources(hits: &[SearchHit]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for hit in hits {
        if !sources.contains(&hit.document_id) {
            sources.push(hit.document_id.clone());
        }
    }
    sources
}

/// Group texts into batches of at most `max_chars`. Longer texts get a batch
/// of their own.
fn batch_texts(texts: &[String], max_chars: usize) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();
    for text in texts {
        if !current.is_empty() && current.len() + text.len() + 2 > max_chars {
            batches.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(text);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

impl RagPipeline {
    /// Create a pipeline over `index` answering with `llm`.
    #[must_use]
    pub fn new(index: ChunkIndex, llm: Arc<dyn LlmClient>, top_k: usize) -> Self {
        Self {
            index,
            llm,
            embedder: None,
            top_k,
        }
    }

    /// Rank by embedding similarity instead of term overlap.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Embed one batch. Failures are logged and leave retrieval lexical.
    async fn try_embed(&self, texts: Vec<String>) -> Option<Vec<Vec<f32>>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(texts).await {
            Ok(vectors) => Some(vectors),
            Err(e) => {
                tracing::warn!(error = %e, "Embedding failed; using lexical ranking");
                None
            }
        }
    }

    /// Embed and index a document's chunks, returning the chunk ids.
    pub async fn index_document(
        &self,
        document_id: &str,
        user_id: &str,
        chunks: &[DocumentChunk],
    ) -> Vec<String> {
        let searchable: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.chunk_type != ChunkType::Image)
            .map(|(n, _)| n)
            .collect();
        let texts = searchable.iter().map(|&n| chunks[n].text.clone()).collect();

        let mut embeddings: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
        if let Some(vectors) = self.try_embed(texts).await {
            for (n, vector) in searchable.into_iter().zip(vectors) {
                embeddings[n] = Some(vector);
            }
        }
        self.index.add_document(document_id, user_id, chunks, embeddings)
    }

    /// The shared index.
    #[must_use]
    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Build the model input for a question.
    #[must_use]
    pub fn build_messages(
        &self,
        question: &str,
        hits: &[SearchHit],
        image: Option<&str>,
    ) -> Vec<Message> {
        let question = if question.trim().is_empty() && image.is_some() {
            IMAGE_ONLY_QUESTION
        } else {
            question
        };
        let prompt = format!("Context:\n{}\n\nQuestion: {question}", build_context(hits));
        let user = match image {
            Some(image) => Message::user_with_image(prompt, as_data_url(image)),
            None => Message::user(prompt),
        };
        vec![Message::system(SYSTEM_PROMPT), user]
    }

    /// Answer `question` from `user_id`'s documents.
    pub async fn query(
        &self,
        user_id: &str,
        question: &str,
        image: Option<&str>,
    ) -> anyhow::Result<QueryAnswer> {
        let query_embedding = if question.trim().is_empty() {
            None
        } else {
            self.try_embed(vec![question.to_string()])
                .await
                .and_then(|vectors| vectors.into_iter().next())
        };
        let hits = self
            .index
            .search(question, query_embedding.as_deref(), user_id, self.top_k);
        tracing::info!(
            user_id = %user_id,
            hits = hits.len(),
            has_image = image.is_some(),
            "Retrieved context for query"
        );

        let messages = self.build_messages(question, &hits, image);
        let answer = self.llm.complete(messages).await?;

        Ok(QueryAnswer {
            answer: answer.trim().to_string(),
            sources: unique_sources(&hits),
        })
    }

    /// Summarize one of `user_id`'s documents.
    ///
    /// Chunks are summarized in batches, then the partial summaries are
    /// combined. Returns `None` when the document has no indexed text.
    pub async fn summarize(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> anyhow::Result<Option<String>> {
        let texts = self.index.document_text(document_id, user_id);
        if texts.is_empty() {
            return Ok(None);
        }

        let mut partials = Vec::new();
        for batch in batch_texts(&texts, SUMMARY_BATCH_CHARS) {
            let prompt = format!("Summarize the following text:\n\n{batch}");
            partials.push(self.summarize_text(&prompt).await?);
        }
        tracing::info!(
            document_id = %document_id,
            batches = partials.len(),
            "Summarized document batches"
        );

        let summary = if partials.len() == 1 {
            partials.remove(0)
        } else {
            let joined = partials.join("\n\n");
            self.summarize_text(&format!(
                "Combine these partial summaries into one concise summary:\n\n{joined}"
            ))
            .await?
        };
        Ok(Some(summary))
    }

    async fn summarize_text(&self, prompt: &str) -> anyhow::Result<String> {
        let answer = self
            .llm
            .complete(vec![Message::system(SUMMARY_PROMPT), Message::user(prompt)])
            .await?;
        Ok(answer.trim().to_string())
    }
}
