//! Uploaded document records and their files on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::{FileType, is_supported_extension};

/// Errors raised by document storage.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The extension is not in the supported set.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// The upload exceeds the configured limit.
    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Upload size.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// No document with this id is visible to the caller.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata of an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document id (UUID v4).
    pub id: String,
    /// Original file name.
    pub title: String,
    /// Location of the stored bytes.
    pub file_path: PathBuf,
    /// Lowercase extension without the dot.
    pub file_type: String,
    /// Upload time.
    pub upload_time: DateTime<Utc>,
    /// Owner.
    pub user_id: String,
    /// Stored size.
    pub size_bytes: usize,
    /// Page count, when known.
    #[serde(default)]
    pub num_pages: Option<u32>,
    /// Whether chunks were extracted and indexed.
    #[serde(default)]
    pub processed: bool,
    /// Ids of the indexed chunks.
    #[serde(default)]
    pub chunk_ids: Vec<String>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl DocumentRecord {
    /// Viewer type for this record.
    #[must_use]
    pub fn viewer_type(&self) -> FileType {
        FileType::from_extension(&self.file_type)
    }
}

/// Lowercase extension of an uploaded file name.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Thread-safe document registry backed by an upload directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    inner: Arc<DocumentStoreInner>,
}

#[derive(Debug)]
struct DocumentStoreInner {
    upload_dir: PathBuf,
    max_upload_bytes: usize,
    documents: RwLock<HashMap<String, DocumentRecord>>,
}

impl DocumentStore {
    /// Create a store that writes into `upload_dir`.
    #[must_use]
    pub fn new(upload_dir: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            inner: Arc::new(DocumentStoreInner {
                upload_dir: upload_dir.into(),
                max_upload_bytes,
                documents: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Validate and persist an upload, returning the new (unprocessed) record.
    ///
    /// The record is not registered until [`DocumentStore::insert`].
    pub async fn save_upload(
        &self,
        filename: &str,
        data: &[u8],
        user_id: &str,
    ) -> Result<DocumentRecord, DocumentError> {
        let ext = extension_of(filename)
            .filter(|ext| is_supported_extension(ext))
            .ok_or_else(|| DocumentError::UnsupportedType(filename.to_string()))?;

        if data.len() > self.inner.max_upload_bytes {
            return Err(DocumentError::TooLarge {
                size: data.len(),
                limit: self.inner.max_upload_bytes,
            });
        }

        tokio::fs::create_dir_all(&self.inner.upload_dir).await?;

        let id = Uuid::new_v4().to_string();
        let file_path = self.inner.upload_dir.join(format!("{id}.{ext}"));
        tokio::fs::write(&file_path, data).await?;

        Ok(DocumentRecord {
            id,
            title: filename.to_string(),
            file_path,
            file_type: ext,
            upload_time: Utc::now(),
            user_id: user_id.to_string(),
            size_bytes: data.len(),
            num_pages: None,
            processed: false,
            chunk_ids: Vec::new(),
            metadata: serde_json::Map::new(),
        })
    }

    /// Register a record.
    pub fn insert(&self, record: DocumentRecord) {
        self.inner
            .documents
            .write()
            .unwrap()
            .insert(record.id.clone(), record);
    }

    /// Fetch a record owned by `user_id`.
    pub fn get_for_user(&self, id: &str, user_id: &str) -> Result<DocumentRecord, DocumentError> {
        self.inner
            .documents
            .read()
            .unwrap()
            .get(id)
            .filter(|doc| doc.user_id == user_id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    /// All records owned by `user_id`, newest first.
    #[must_use]
    pub fn list_for_user(&self, user_id: &str) -> Vec<DocumentRecord> {
        let mut docs: Vec<DocumentRecord> = self
            .inner
            .documents
            .read()
            .unwrap()
            .values()
            .filter(|doc| doc.user_id == user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
        docs
    }

    /// Remove a record owned by `user_id` and delete its file.
    ///
    /// A file that is already gone is not an error.
    pub async fn remove_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<DocumentRecord, DocumentError> {
        let record = {
            let mut guard = self.inner.documents.write().unwrap();
            match guard.get(id) {
                Some(doc) if doc.user_id == user_id => guard.remove(id),
                _ => None,
            }
        }
        .ok_or_else(|| DocumentError::NotFound(id.to_string()))?;

        match tokio::fs::remove_file(&record.file_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    document_id = %id,
                    path = %record.file_path.display(),
                    "Stored file already missing"
                );
            }
            Err(e) => return Err(e.into()),
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> DocumentStore {
        DocumentStore::new(dir, 1024)
    }

    #[tokio::test]
    async fn test_save_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let record = store.save_upload("Notes.MD", b"# Title", "alice").await.unwrap();
        assert_eq!(record.file_type, "md");
        assert_eq!(record.size_bytes, 7);
        assert!(record.file_path.starts_with(dir.path()));
        assert!(record.file_path.exists());

        store.insert(record.clone());
        assert_eq!(store.get_for_user(&record.id, "alice").unwrap().title, "Notes.MD");
    }

    #[tokio::test]
    async fn test_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path())
            .save_upload("virus.exe", b"MZ", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedType(_)));

        let err = store(dir.path())
            .save_upload("README", b"text", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path())
            .save_upload("big.txt", &vec![b'a'; 2048], "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::TooLarge { size: 2048, limit: 1024 }));
    }

    #[tokio::test]
    async fn test_documents_are_scoped_to_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let record = store.save_upload("a.txt", b"a", "alice").await.unwrap();
        store.insert(record.clone());

        assert!(store.get_for_user(&record.id, "bob").is_err());
        assert!(store.list_for_user("bob").is_empty());
        assert!(store.remove_for_user(&record.id, "bob").await.is_err());
        assert_eq!(store.list_for_user("alice").len(), 1);
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let record = store.save_upload("a.csv", b"x,y", "alice").await.unwrap();
        store.insert(record.clone());

        store.remove_for_user(&record.id, "alice").await.unwrap();

        assert!(!record.file_path.exists());
        assert!(store.get_for_user(&record.id, "alice").is_err());
    }
}
