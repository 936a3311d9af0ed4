//! Chat panel components.
//!
//! The panel is re-rendered as a whole after every send and swapped in by
//! HTMX. Client-only state (typed text, picked file) lives in Alpine.

mod header;
mod input_area;
mod message_list;
mod panel;

pub use header::ChatHeader;
pub use input_area::ChatInputArea;
pub use message_list::ChatMessageList;
pub use panel::ChatPanel;
