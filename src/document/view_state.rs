//! Document panel view state.
//!
//! The loading flag and pagination are keyed off the document id and are
//! always reset together through [`DocumentViewState::reset_for`].

use serde::{Deserialize, Serialize};

use super::content::DocumentContent;
use super::kind::{FileType, ViewerBranch};

/// Readiness signal reported by a sub-renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum RenderSignal {
    /// The paged renderer loaded the document.
    PagedLoaded {
        /// Total number of pages.
        page_count: u32,
    },
    /// The image finished loading.
    ImageLoaded,
}

impl RenderSignal {
    fn branch(self) -> ViewerBranch {
        match self {
            Self::PagedLoaded { .. } => ViewerBranch::Paged,
            Self::ImageLoaded => ViewerBranch::Image,
        }
    }
}

/// State of one document panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentViewState {
    document_id: String,
    file_type: FileType,
    content: DocumentContent,
    page_number: u32,
    page_count: Option<u32>,
    loading: bool,
}

impl DocumentViewState {
    /// Fresh state for a document: loading, first page, unknown page count.
    #[must_use]
    pub fn new(
        document_id: impl Into<String>,
        file_type: FileType,
        content: DocumentContent,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            file_type,
            content,
            page_number: 1,
            page_count: None,
            loading: true,
        }
    }

    /// Id of the displayed document.
    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Declared type of the displayed document.
    #[must_use]
    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    /// Payload of the displayed document.
    #[must_use]
    pub fn content(&self) -> &DocumentContent {
        &self.content
    }

    /// Active renderer branch.
    #[must_use]
    pub fn branch(&self) -> ViewerBranch {
        ViewerBranch::for_file_type(&self.file_type)
    }

    /// Whether the spinner is shown.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current page (1-based). Only meaningful for paged documents.
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Page count reported by the paged renderer.
    #[must_use]
    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    /// Switch to another document.
    ///
    /// When `document_id` differs from the current one, the payload is
    /// replaced and loading, page number, and page count are reset in one
    /// step. Returns whether a reset happened.
    pub fn reset_for(
        &mut self,
        document_id: &str,
        file_type: FileType,
        content: DocumentContent,
    ) -> bool {
        if self.document_id == document_id {
            return false;
        }
        *self = Self::new(document_id, file_type, content);
        true
    }

    /// Apply a readiness signal.
    ///
    /// Signals from a sub-renderer other than the active one are ignored.
    /// Returns whether the state changed.
    pub fn on_ready(&mut self, signal: RenderSignal) -> bool {
        if signal.branch() != self.branch() {
            tracing::debug!(
                document_id = %self.document_id,
                signal = ?signal,
                branch = ?self.branch(),
                "Ignoring render signal for inactive branch"
            );
            return false;
        }
        if let RenderSignal::PagedLoaded { page_count } = signal {
            let page_count = page_count.max(1);
            self.page_count = Some(page_count);
            self.page_number = self.page_number.clamp(1, page_count);
        }
        self.loading = false;
        true
    }

    /// Mark a synchronously rendered branch as ready.
    ///
    /// No-op for branches that wait on a sub-renderer.
    pub fn mark_rendered(&mut self) {
        if self.branch().renders_synchronously() {
            self.loading = false;
        }
    }

    /// Advance one page. No-op before the page count is known.
    pub fn next_page(&mut self) -> u32 {
        self.go_to_page(self.page_number.saturating_add(1))
    }

    /// Go back one page.
    pub fn previous_page(&mut self) -> u32 {
        self.go_to_page(self.page_number.saturating_sub(1))
    }

    /// Jump to `page`, clamped to the known page range.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        if let Some(count) = self.page_count {
            self.page_number = page.clamp(1, count);
        }
        self.page_number
    }
}
