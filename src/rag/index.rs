//! In-memory chunk index.
//!
//! Chunks carrying an embedding are ranked by cosine similarity to the
//! query embedding. Without embeddings the index falls back to ranking by
//! query term overlap.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use super::embedding::cosine_similarity;
use crate::document::{ChunkType, DocumentChunk};

#[derive(Debug, Clone)]
struct IndexedChunk {
    id: String,
    document_id: String,
    user_id: String,
    page_num: u32,
    text: String,
    terms: HashSet<String>,
    embedding: Option<Vec<f32>>,
}

/// A ranked retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Chunk id (`<document_id>_<n>`).
    pub chunk_id: String,
    /// Owning document.
    pub document_id: String,
    /// Page the chunk came from.
    pub page_num: u32,
    /// Chunk text.
    pub text: String,
    /// Cosine similarity, or the fraction of query terms found in the
    /// chunk when ranking lexically.
    pub score: f32,
}

/// Lowercased alphanumeric terms of at least two characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Shared chunk index.
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    chunks: Arc<RwLock<Vec<IndexedChunk>>>,
}

impl ChunkIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the chunks of a document and return their ids.
    ///
    /// `embeddings` lines up with `chunks`; missing entries leave a chunk
    /// to lexical ranking. Image chunks get ids but are not searchable.
    pub fn add_document(
        &self,
        document_id: &str,
        user_id: &str,
        chunks: &[DocumentChunk],
        embeddings: Vec<Option<Vec<f32>>>,
    ) -> Vec<String> {
        let mut embeddings = embeddings.into_iter();
        let mut guard = self.chunks.write().unwrap();
        chunks
            .iter()
            .enumerate()
            .map(|(n, chunk)| {
                let embedding = embeddings.next().flatten();
                let id = format!("{document_id}_{n}");
                let (chunk_terms, embedding) = if chunk.chunk_type == ChunkType::Image {
                    (HashSet::new(), None)
                } else {
                    (terms(&chunk.text), embedding)
                };
                guard.push(IndexedChunk {
                    id: id.clone(),
                    document_id: document_id.to_string(),
                    user_id: user_id.to_string(),
                    page_num: chunk.page_num,
                    text: chunk.text.clone(),
                    terms: chunk_terms,
                    embedding,
                });
                id
            })
            .collect()
    }

    /// Drop every chunk of a document. Returns the number removed.
    pub fn remove_document(&self, document_id: &str) -> usize {
        let mut guard = self.chunks.write().unwrap();
        let before = guard.len();
        guard.retain(|c| c.document_id != document_id);
        before - guard.len()
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.read().unwrap().len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of a document's searchable chunks, in indexing order.
    #[must_use]
    pub fn document_text(&self, document_id: &str, user_id: &str) -> Vec<String> {
        self.chunks
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.document_id == document_id && c.user_id == user_id && !c.terms.is_empty())
            .map(|c| c.text.clone())
            .collect()
    }

    /// Best `limit` chunks of `user_id`'s documents for `query`.
    ///
    /// With a query embedding, embedded chunks are ranked by similarity.
    /// When there is no query embedding or none of the user's chunks is
    /// embedded, chunks sharing no term with the query are never returned.
    /// Equal scores keep indexing order.
    #[must_use]
    pub fn search(
        &self,
        query: &str,
        query_embedding: Option<&[f32]>,
        user_id: &str,
        limit: usize,
    ) -> Vec<SearchHit> {
        if limit == 0 {
            return Vec::new();
        }
        let guard = self.chunks.read().unwrap();
        let owned: Vec<&IndexedChunk> = guard.iter().filter(|c| c.user_id == user_id).collect();

        let semantic: Vec<SearchHit> = match query_embedding {
            Some(query_embedding) => owned
                .iter()
                .filter_map(|c| {
                    let embedding = c.embedding.as_deref()?;
                    Some(c.hit(cosine_similarity(query_embedding, embedding)))
                })
                .collect(),
            None => Vec::new(),
        };

        let mut hits = if semantic.is_empty() {
            lexical_hits(&owned, query)
        } else {
            semantic
        };
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }
}

impl IndexedChunk {
    fn hit(&self, score: f32) -> SearchHit {
        SearchHit {
            chunk_id: self.id.clone(),
            document_id: self.document_id.clone(),
            page_num: self.page_num,
            text: self.text.clone(),
            score,
        }
    }
}

fn lexical_hits(chunks: &[&IndexedChunk], query: &str) -> Vec<SearchHit> {
    let query_terms = terms(query);
    if query_terms.is_empty() {
        return Vec::new();
    }
    #[allow(clippy::cast_precision_loss)]
    let total = query_terms.len() as f32;

    chunks
        .iter()
        .filter_map(|c| {
            let matched = query_terms.intersection(&c.terms).count();
            #[allow(clippy::cast_precision_loss)]
            let score = matched as f32 / total;
            (matched > 0).then(|| c.hit(score))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, chunk_type: ChunkType) -> DocumentChunk {
        DocumentChunk {
            text: text.to_string(),
            chunk_type,
            page_num: 0,
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_chunk_ids() {
        let index = ChunkIndex::new();
        let ids = index.add_document(
            "doc",
            "alice",
            &[chunk("a b", ChunkType::Text), chunk("c d", ChunkType::Text)],
            Vec::new(),
        );
        assert_eq!(ids, vec!["doc_0", "doc_1"]);
    }

    #[test]
    fn test_search_ranks_by_overlap() {
        let index = ChunkIndex::new();
        let text = |s: &str| [chunk(s, ChunkType::Text)];
        index.add_document("a", "alice", &text("The pump pressure is 40 bar."), Vec::new());
        index.add_document("b", "alice", &text("Pump maintenance schedule."), Vec::new());
        index.add_document("c", "alice", &text("Unrelated text."), Vec::new());

        let hits = index.search("What is the pump pressure?", None, "alice", 5);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "a");
        assert_eq!(hits[1].document_id, "b");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_search_is_scoped_and_skips_images() {
        let index = ChunkIndex::new();
        index.add_document("a", "alice", &[chunk("pump", ChunkType::Text)], Vec::new());
        index.add_document("img", "bob", &[chunk("pump", ChunkType::Image)], Vec::new());

        assert!(index.search("pump", None, "bob", 5).is_empty());
        assert_eq!(index.search("pump", None, "alice", 5).len(), 1);
    }

    #[test]
    fn test_remove_document() {
        let index = ChunkIndex::new();
        let chunks = [chunk("x1", ChunkType::Text), chunk("x2", ChunkType::Code)];
        index.add_document("a", "alice", &chunks, Vec::new());
        assert_eq!(index.remove_document("a"), 2);
        assert!(index.is_empty());
    }

    #[test]
    fn test_limit() {
        let index = ChunkIndex::new();
        for n in 0..10 {
            let chunks = [chunk("valve", ChunkType::Text)];
            index.add_document(&format!("d{n}"), "alice", &chunks, Vec::new());
        }
        assert_eq!(index.search("valve", None, "alice", 5).len(), 5);
        assert!(index.search("valve", None, "alice", 0).is_empty());
    }

    #[test]
    fn test_semantic_search_finds_paraphrase() {
        let index = ChunkIndex::new();
        index.add_document(
            "cars",
            "alice",
            &[chunk("automobile engine", ChunkType::Text)],
            vec![Some(vec![0.9, 0.1])],
        );
        index.add_document(
            "fish",
            "alice",
            &[chunk("salmon recipes", ChunkType::Text)],
            vec![Some(vec![0.0, 1.0])],
        );

        assert!(index.search("car", None, "alice", 5).is_empty());

        let hits = index.search("car", Some(&[1.0, 0.0]), "alice", 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, "cars");
    }

    #[test]
    fn test_semantic_search_falls_back_without_embedded_chunks() {
        let index = ChunkIndex::new();
        index.add_document("a", "alice", &[chunk("pump pressure", ChunkType::Text)], Vec::new());

        let hits = index.search("pump", Some(&[1.0, 0.0]), "alice", 5);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_document_text_skips_images() {
        let index = ChunkIndex::new();
        index.add_document(
            "a",
            "alice",
            &[chunk("intro", ChunkType::Text), chunk("QUJD", ChunkType::Image)],
            Vec::new(),
        );
        assert_eq!(index.document_text("a", "alice"), vec!["intro".to_string()]);
        assert!(index.document_text("a", "bob").is_empty());
    }
}
