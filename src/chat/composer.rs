//! Pending chat input and the submit flow.

use async_trait::async_trait;

use super::attachment::{AttachmentError, ImageAttachment, SelectedFile};

/// Handler invoked when the user submits a message.
///
/// Supplied by the caller of the chat panel. `image_data_url` is a
/// `data:` URL when an image was attached.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver a message.
    async fn send(&self, text: String, image_data_url: Option<String>) -> anyhow::Result<()>;
}

/// Errors raised by [`ChatComposer::submit`].
#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    /// The attachment could not be encoded.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    /// The send handler failed.
    #[error("Send failed: {0}")]
    Send(#[source] anyhow::Error),
}

/// Result of a submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing to send: empty text and no attachment.
    Skipped,
    /// The handler accepted the message and the input was cleared.
    Sent,
}

/// Pending input of the chat form.
#[derive(Debug, Default, Clone)]
pub struct ChatComposer {
    text: String,
    attachment: Option<ImageAttachment>,
}

impl ChatComposer {
    /// Create an empty composer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current input text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the input text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Pending image attachment, if any.
    #[must_use]
    pub fn attachment(&self) -> Option<&ImageAttachment> {
        self.attachment.as_ref()
    }

    /// Offer a file as the attachment.
    ///
    /// Non-image files are ignored and leave the current attachment in
    /// place. Returns whether the file was accepted.
    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        match ImageAttachment::try_from_file(file) {
            Ok(attachment) => {
                self.attachment = Some(attachment);
                true
            }
            Err(rejected) => {
                tracing::debug!(
                    file = %rejected.name(),
                    mime_type = %rejected.mime_type(),
                    "Ignoring non-image attachment"
                );
                false
            }
        }
    }

    /// Whether there is anything to send.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    /// Whether the submit button should be enabled.
    #[must_use]
    pub fn can_submit(&self, loading: bool) -> bool {
        !loading && self.has_content()
    }

    /// Clear text and attachment.
    pub fn clear(&mut self) {
        self.text.clear();
        self.attachment = None;
    }

    /// Submit the pending input through `sender`.
    ///
    /// The pending state is only cleared after the sender succeeds. On
    /// either error the text and attachment are kept as they were.
    pub async fn submit(
        &mut self,
        sender: &dyn MessageSender,
    ) -> Result<SubmitOutcome, ComposerError> {
        if !self.has_content() {
            return Ok(SubmitOutcome::Skipped);
        }

        let image_data_url = match &self.attachment {
            Some(attachment) => Some(attachment.read_as_data_url().await?),
            None => None,
        };

        sender
            .send(self.text.clone(), image_data_url)
            .await
            .map_err(ComposerError::Send)?;

        self.clear();
        Ok(SubmitOutcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        calls: Mutex<Vec<(String, Option<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, text: String, image_data_url: Option<String>) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push((text, image_data_url));
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(())
        }
    }

    fn png(name: &str) -> SelectedFile {
        SelectedFile::from_bytes(name, "image/png", vec![0x89, 0x50])
    }

    #[tokio::test]
    async fn test_empty_submit_never_calls_sender() {
        let sender = RecordingSender::default();
        let mut composer = ChatComposer::new();
        composer.set_text("   \n\t");

        let outcome = composer.submit(&sender).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert!(sender.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_image_selection_keeps_previous_attachment() {
        let mut composer = ChatComposer::new();
        assert!(composer.select_file(png("chart.png")));

        let file = SelectedFile::from_bytes("notes.txt", "text/plain", b"hi".to_vec());
        let accepted = composer.select_file(file);

        assert!(!accepted);
        assert_eq!(composer.attachment().unwrap().name(), "chart.png");
    }

    #[test]
    fn test_non_image_selection_on_empty_composer() {
        let mut composer = ChatComposer::new();
        composer.select_file(SelectedFile::from_bytes("a.pdf", "application/pdf", vec![]));
        assert!(composer.attachment().is_none());
    }

    #[tokio::test]
    async fn test_successful_send_clears_input() {
        let sender = RecordingSender::default();
        let mut composer = ChatComposer::new();
        composer.set_text("What is on this chart?");
        composer.select_file(png("chart.png"));

        let outcome = composer.submit(&sender).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Sent);
        assert_eq!(composer.text(), "");
        assert!(composer.attachment().is_none());

        let calls = sender.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "What is on this chart?");
        assert!(calls[0].1.as_deref().unwrap().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_image_only_submit_is_sent() {
        let sender = RecordingSender::default();
        let mut composer = ChatComposer::new();
        composer.select_file(png("scan.png"));

        let outcome = composer.submit(&sender).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Sent);
        assert_eq!(sender.calls.lock().unwrap()[0].0, "");
    }

    #[tokio::test]
    async fn test_failed_send_keeps_pending_state() {
        let sender = RecordingSender {
            fail: true,
            ..Default::default()
        };
        let mut composer = ChatComposer::new();
        composer.set_text("retry me");
        composer.select_file(png("a.png"));

        let err = composer.submit(&sender).await.unwrap_err();

        assert!(matches!(err, ComposerError::Send(_)));
        assert_eq!(composer.text(), "retry me");
        assert!(composer.attachment().is_some());
    }

    #[tokio::test]
    async fn test_failed_read_rejects_without_sending() {
        let sender = RecordingSender::default();
        let mut composer = ChatComposer::new();
        composer.set_text("look");
        composer.select_file(SelectedFile::from_path("/no/such/dir/photo.png"));

        let err = composer.submit(&sender).await.unwrap_err();

        assert!(matches!(err, ComposerError::Attachment(_)));
        assert!(sender.calls.lock().unwrap().is_empty());
        assert_eq!(composer.text(), "look");
    }

    #[test]
    fn test_can_submit_respects_loading() {
        let mut composer = ChatComposer::new();
        assert!(!composer.can_submit(false));

        composer.set_text("hello");
        assert!(composer.can_submit(false));
        assert!(!composer.can_submit(true));
    }
}
