//! Document panel state and the document backend.
//!
//! # Architecture
//!
//! - [`FileType`] / [`ViewerBranch`]: declared type and the renderer it selects
//! - [`DocumentContent`]: materialized payload handed to the viewer
//! - [`DocumentViewState`]: loading flag and pagination, reset per document
//! - [`DocumentStore`]: uploaded document records and files
//! - [`DocumentLoader`]: retrieval chunks and viewer payloads from disk
//! - [`ViewerStore`]: open document panels, keyed by viewer id

mod content;
mod kind;
mod loader;
mod store;
mod view_state;
mod viewers;

pub use content::DocumentContent;
pub use kind::{FileType, SUPPORTED_EXTENSIONS, ViewerBranch, is_supported_extension};
pub use loader::{ChunkType, DocumentChunk, DocumentLoader, LoaderError, pdf_page_count};
pub use store::{DocumentError, DocumentRecord, DocumentStore, extension_of};
pub use view_state::{DocumentViewState, RenderSignal};
pub use viewers::ViewerStore;
