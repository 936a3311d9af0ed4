//! Declared document types and viewer branch selection.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Extensions accepted for upload (lowercase, with leading dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Documents
    ".pdf", ".docx", ".txt", ".md",
    // Spreadsheets
    ".csv", ".xlsx",
    // Presentations
    ".pptx",
    // Code & notebooks
    ".ipynb", ".py",
    // Images
    ".png", ".jpg", ".jpeg",
    // Web
    ".html",
];

/// Whether `extension` (with or without leading dot) can be uploaded.
#[must_use]
pub fn is_supported_extension(extension: &str) -> bool {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| supported[1..] == ext)
}

/// Declared content type of a document.
///
/// Unknown declarations are kept verbatim in [`FileType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Paged document.
    Pdf,
    /// Raster image.
    Image,
    /// Source code.
    Code,
    /// Tabular data.
    Table,
    /// Anything else; rendered as raw text.
    Other(String),
}

impl FileType {
    /// Parse a declared type name. Matching is case-insensitive.
    #[must_use]
    pub fn parse(declared: &str) -> Self {
        match declared.trim().to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "image" => Self::Image,
            "code" => Self::Code,
            "table" => Self::Table,
            _ => Self::Other(declared.to_string()),
        }
    }

    /// Viewer type for a stored file extension.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" => Self::Image,
            "py" | "ipynb" | "html" => Self::Code,
            "csv" => Self::Table,
            _ => Self::Other(ext),
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Code => "code",
            Self::Table => "table",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FileType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FileType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// The sub-renderer used for a file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerBranch {
    /// Paged document renderer with page indicator.
    Paged,
    /// Image element.
    Image,
    /// Syntax-highlighted code block.
    Code,
    /// HTML table.
    Table,
    /// Preformatted raw text.
    RawText,
}

impl ViewerBranch {
    /// Select the branch for a declared type.
    #[must_use]
    pub fn for_file_type(file_type: &FileType) -> Self {
        match file_type {
            FileType::Pdf => Self::Paged,
            FileType::Image => Self::Image,
            FileType::Code => Self::Code,
            FileType::Table => Self::Table,
            FileType::Other(_) => Self::RawText,
        }
    }

    /// Stable name used in markup.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paged => "paged",
            Self::Image => "image",
            Self::Code => "code",
            Self::Table => "table",
            Self::RawText => "raw-text",
        }
    }

    /// Whether the branch is ready as soon as it is rendered.
    ///
    /// Code is highlighted server-side; tables and raw text need no
    /// sub-renderer at all.
    #[must_use]
    pub fn renders_synchronously(self) -> bool {
        matches!(self, Self::Code | Self::Table | Self::RawText)
    }
}
