//! Local document loading: retrieval chunks and viewer payloads.
//!
//! Text-like formats are read directly. PDFs and office formats go through
//! `kreuzberg`; PDF page counts come from `hayro`.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use hayro_interpret::hayro_syntax::Pdf;
use serde::{Deserialize, Serialize};
use text_splitter::{Characters, ChunkConfig, TextSplitter};

use super::content::DocumentContent;
use super::kind::FileType;
use super::store::DocumentRecord;

/// Kind of content a chunk carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    /// Prose.
    Text,
    /// Base64 image payload.
    Image,
    /// Tab-separated table rows.
    Table,
    /// Source code.
    Code,
}

/// A piece of a document prepared for retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk text (base64 for images).
    pub text: String,
    /// Content kind.
    pub chunk_type: ChunkType,
    /// Page the chunk came from (0 when the format has no pages).
    pub page_num: u32,
    /// Loader-specific metadata.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl DocumentChunk {
    fn new(text: impl Into<String>, chunk_type: ChunkType, metadata: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            chunk_type,
            page_num: 0,
            metadata: match metadata {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        }
    }
}

/// Errors raised while loading a document.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// No loader exists for this extension.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Invalid chunking parameters.
    #[error("Invalid chunk configuration: {0}")]
    ChunkConfig(String),

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The notebook JSON could not be parsed.
    #[error("Notebook parse error: {0}")]
    Notebook(#[from] serde_json::Error),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<NotebookCell>,
}

#[derive(Debug, Deserialize)]
struct NotebookCell {
    cell_type: String,
    #[serde(default)]
    source: NotebookSource,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NotebookSource {
    Joined(String),
    Lines(Vec<String>),
}

impl Default for NotebookSource {
    fn default() -> Self {
        Self::Joined(String::new())
    }
}

impl NotebookSource {
    fn into_text(self) -> String {
        match self {
            Self::Joined(s) => s,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

/// Loads documents from disk.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl DocumentLoader {
    /// Create a loader with explicit chunk sizing (in characters).
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split text into overlapping, trimmed chunks.
    pub fn split_text(&self, text: &str) -> Result<Vec<String>, LoaderError> {
        let config = ChunkConfig::new(self.chunk_size)
            .with_sizer(Characters)
            .with_trim(true)
            .with_overlap(self.chunk_overlap)
            .map_err(|e| LoaderError::ChunkConfig(e.to_string()))?;
        let splitter = TextSplitter::new(config);
        Ok(splitter.chunks(text).map(ToString::to_string).collect())
    }

    /// Extract retrieval chunks from the file at `path`.
    pub async fn load_chunks(&self, path: &Path) -> Result<Vec<DocumentChunk>, LoaderError> {
        let ext = extension(path);
        match ext.as_str() {
            "txt" | "md" => {
                let text = tokio::fs::read_to_string(path).await?;
                let kind = if ext == "md" { "markdown" } else { "text" };
                self.split_into(&text, ChunkType::Text, kind)
            }
            "py" | "html" => {
                let text = tokio::fs::read_to_string(path).await?;
                self.split_into(&text, ChunkType::Code, &ext)
            }
            "ipynb" => {
                let raw = tokio::fs::read_to_string(path).await?;
                let notebook: Notebook = serde_json::from_str(&raw)?;
                Ok(notebook
                    .cells
                    .into_iter()
                    .enumerate()
                    .map(|(idx, cell)| {
                        let chunk_type = if cell.cell_type == "code" {
                            ChunkType::Code
                        } else {
                            ChunkType::Text
                        };
                        DocumentChunk::new(
                            cell.source.into_text(),
                            chunk_type,
                            serde_json::json!({ "cell_type": cell.cell_type, "cell_number": idx }),
                        )
                    })
                    .filter(|chunk| !chunk.text.trim().is_empty())
                    .collect())
            }
            "csv" => {
                let rows = read_csv(path).await?;
                let text = DocumentContent::Table(rows).as_display_text();
                Ok(vec![DocumentChunk::new(text, ChunkType::Table, serde_json::json!({}))])
            }
            "png" | "jpg" | "jpeg" => {
                let data = tokio::fs::read(path).await?;
                let encoded = base64::engine::general_purpose::STANDARD.encode(data);
                Ok(vec![DocumentChunk::new(
                    encoded,
                    ChunkType::Image,
                    serde_json::json!({ "type": "image" }),
                )])
            }
            "pdf" | "docx" | "pptx" | "xlsx" => {
                let Some(text) = extract_text(path).await else {
                    return Ok(Vec::new());
                };
                if ext == "pdf" {
                    self.split_pages(&text)
                } else {
                    self.split_into(&text, ChunkType::Text, &ext)
                }
            }
            _ => Err(LoaderError::UnsupportedType(ext)),
        }
    }

    /// Build the viewer payload for a stored document.
    ///
    /// `raw_url` is where the browser can fetch the original bytes; it is
    /// used for paged documents and images.
    pub async fn load_content(
        &self,
        record: &DocumentRecord,
        raw_url: &str,
    ) -> Result<DocumentContent, LoaderError> {
        let path = record.file_path.as_path();
        match record.viewer_type() {
            FileType::Pdf | FileType::Image => Ok(DocumentContent::Url(raw_url.to_string())),
            FileType::Table => Ok(DocumentContent::Table(read_csv(path).await?)),
            FileType::Code if record.file_type == "ipynb" => {
                let raw = tokio::fs::read_to_string(path).await?;
                let notebook: Notebook = serde_json::from_str(&raw)?;
                let text = notebook
                    .cells
                    .into_iter()
                    .map(|cell| cell.source.into_text())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Ok(DocumentContent::Text(text))
            }
            FileType::Code => Ok(DocumentContent::Text(tokio::fs::read_to_string(path).await?)),
            FileType::Other(_) => match tokio::fs::read_to_string(path).await {
                Ok(text) => Ok(DocumentContent::Text(text)),
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Ok(DocumentContent::Text(
                    format!("{} cannot be previewed as text.", record.title),
                )),
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Chunk extracted PDF text page by page. Pages are separated by form
    /// feeds; text without any counts as page 1.
    fn split_pages(&self, text: &str) -> Result<Vec<DocumentChunk>, LoaderError> {
        let mut chunks = Vec::new();
        for (idx, page) in text.split('\x0c').enumerate() {
            let page_num = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            for mut chunk in self.split_into(page, ChunkType::Text, "pdf")? {
                chunk.page_num = page_num;
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    fn split_into(
        &self,
        text: &str,
        chunk_type: ChunkType,
        kind: &str,
    ) -> Result<Vec<DocumentChunk>, LoaderError> {
        Ok(self
            .split_text(text)?
            .into_iter()
            .map(|piece| DocumentChunk::new(piece, chunk_type, serde_json::json!({ "type": kind })))
            .collect())
    }
}

/// Number of pages in a PDF, or `None` if it cannot be parsed.
#[must_use]
pub fn pdf_page_count(data: &[u8]) -> Option<u32> {
    match Pdf::new(Arc::new(data.to_vec())) {
        Ok(pdf) => u32::try_from(pdf.pages().len()).ok(),
        Err(e) => {
            tracing::debug!(error = ?e, "Could not parse PDF for page count");
            None
        }
    }
}

/// Text of a PDF or office document.
///
/// Extraction failures are logged and yield `None`; the document stays
/// viewable but is not searchable.
async fn extract_text(path: &Path) -> Option<String> {
    let path_buf = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || {
        kreuzberg::extract_file_sync(path_buf, None, &kreuzberg::ExtractionConfig::default())
    })
    .await;

    match result {
        Ok(Ok(extracted)) => Some(extracted.content),
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "Text extraction failed");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Extraction task failed");
            None
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

async fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, LoaderError> {
    let data = tokio::fs::read(path).await?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(ToString::to_string).collect());
    }
    Ok(rows)
}
