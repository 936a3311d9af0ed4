//! Document panel and document list components.

mod highlight;
mod list;
mod panel;

pub use list::DocumentList;
pub use panel::DocumentPanel;
