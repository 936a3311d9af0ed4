//! Image attachments for pending chat submissions.

use std::path::PathBuf;

use base64::Engine;

/// Errors raised while reading an attachment.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// The backing file could not be read.
    #[error("Failed to read attachment '{name}': {source}")]
    Read {
        /// Display name of the attachment.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Where the bytes of a selected file live.
#[derive(Debug, Clone)]
enum FileSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A file picked by the user, before it is accepted as an attachment.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    source: FileSource,
}

impl SelectedFile {
    /// A file whose bytes are already in memory (e.g. a multipart field).
    #[must_use]
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: FileSource::Bytes(data),
        }
    }

    /// A file on disk. The MIME type is guessed from the extension.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();
        Self {
            name,
            mime_type,
            source: FileSource::Path(path),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Whether the declared type is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// An accepted image attachment.
///
/// Only constructed from a [`SelectedFile`] with an `image/*` type.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    file: SelectedFile,
}

impl ImageAttachment {
    /// Accept `file` if it is an image; otherwise hand it back.
    pub fn try_from_file(file: SelectedFile) -> Result<Self, SelectedFile> {
        if file.is_image() {
            Ok(Self { file })
        } else {
            Err(file)
        }
    }

    /// Display name of the attached file.
    #[must_use]
    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// MIME type of the attached file.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.file.mime_type()
    }

    /// Read the attachment and encode it as `data:<mime>;base64,<payload>`.
    pub async fn read_as_data_url(&self) -> Result<String, AttachmentError> {
        let data = match &self.file.source {
            FileSource::Bytes(data) => std::borrow::Cow::Borrowed(data.as_slice()),
            FileSource::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| AttachmentError::Read {
                        name: self.file.name.clone(),
                        source,
                    })?;
                std::borrow::Cow::Owned(bytes)
            }
        };
        Ok(encode_data_url(self.mime_type(), &data))
    }
}

/// Encode raw bytes as a base64 data URL.
#[must_use]
pub fn encode_data_url(mime_type: &str, data: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(data);
    format!("data:{mime_type};base64,{payload}")
}

/// Split a data URL into its MIME type and base64 payload.
#[must_use]
pub fn split_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (mime_type, payload) = rest.split_once(";base64,")?;
    Some((mime_type, payload))
}
