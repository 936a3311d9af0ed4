//! Materialized document payloads handed to the viewer.

use serde::{Deserialize, Serialize};

/// Content handed to the document panel.
///
/// The shape is expected to match the declared file type, but nothing
/// enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DocumentContent {
    /// A URL (HTTP or data URL) for paged documents and images.
    Url(String),
    /// Text for code and raw-text display.
    Text(String),
    /// Rows of cells for tables.
    Table(Vec<Vec<String>>),
}

impl DocumentContent {
    /// Text form of the payload for text-like branches.
    ///
    /// Tables are flattened to tab-separated lines.
    #[must_use]
    pub fn as_display_text(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Text(text) => text.clone(),
            Self::Table(rows) => rows
                .iter()
                .map(|row| row.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Rows for the table branch; non-table payloads yield no rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        match self {
            Self::Table(rows) => rows,
            Self::Url(_) | Self::Text(_) => &[],
        }
    }

    /// Source URL for media branches.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Text(_) | Self::Table(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_as_text() {
        let content = DocumentContent::Table(vec![
            vec!["a".into(), "b".into()],
            vec!["1".into(), "2".into()],
        ]);
        assert_eq!(content.as_display_text(), "a\tb\n1\t2");
    }

    #[test]
    fn test_mismatched_shapes_degrade() {
        let text = DocumentContent::Text("plain".into());
        assert!(text.rows().is_empty());
        assert!(text.url().is_none());
    }
}
