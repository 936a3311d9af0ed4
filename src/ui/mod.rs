//! UI components and layouts.
//!
//! Leptos SSR components rendered to HTML strings, following ShadCN-UI
//! design principles. Interaction is HTMX fragments plus Alpine state.
//!
//! # Structure
//!
//! - [`app`]: Page shell and render entry points
//! - [`components`]: Reusable ShadCN-style UI components
//! - [`chat`]: Chat panel
//! - [`document`]: Document panel and document list

pub mod app;
pub mod chat;
pub mod components;
pub mod document;

pub use app::{
    render_chat_page, render_chat_panel, render_document_list, render_document_panel,
    render_viewer_page,
};
