//! Chat panel state and conversation storage.
//!
//! The chat panel is a function of its message list, a loading flag, and the
//! pending input owned by a [`ChatComposer`]. Sending is delegated to a
//! caller-supplied [`MessageSender`].
//!
//! # Architecture
//!
//! - [`ChatMessage`]: A single displayed message with optional citations
//! - [`ChatComposer`]: Pending text and image attachment, submit logic
//! - [`ChatPanelState`]: Displayed messages, loading flag, scroll anchor
//! - [`ConversationStore`]: Thread-safe store for all conversations
//!
//! # Example
//!
//! ```rust
//! use notebook_llm::chat::{ChatComposer, SelectedFile};
//!
//! let mut composer = ChatComposer::new();
//! composer.set_text("What does chapter 2 say?");
//! let notes = SelectedFile::from_bytes("notes.txt", "text/plain", b"x".to_vec());
//! assert!(!composer.select_file(notes));
//! assert!(composer.attachment().is_none());
//! ```

mod attachment;
mod composer;
mod message;
mod panel;
mod store;

pub use attachment::{
    AttachmentError, ImageAttachment, SelectedFile, encode_data_url, split_data_url,
};
pub use composer::{ChatComposer, ComposerError, MessageSender, SubmitOutcome};
pub use message::{ChatMessage, ChatRole};
pub use panel::{ChatPanelState, ScrollRequest};
pub use store::{Conversation, ConversationStore};
