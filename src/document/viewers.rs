//! Open document panels.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::view_state::DocumentViewState;

/// Default viewer idle timeout (30 minutes).
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct OpenViewer {
    owner: String,
    state: DocumentViewState,
    last_access: DateTime<Utc>,
}

impl OpenViewer {
    fn is_idle_for(&self, timeout: Duration) -> bool {
        (Utc::now() - self.last_access)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe map of viewer id to panel state.
///
/// Every panel belongs to the user who opened it. Lookups by anyone else
/// behave as if the panel did not exist.
#[derive(Debug, Clone, Default)]
pub struct ViewerStore {
    inner: Arc<RwLock<HashMap<String, OpenViewer>>>,
}

impl ViewerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a panel for `user_id` and return its id.
    pub fn open(&self, user_id: &str, state: DocumentViewState) -> String {
        let id = Uuid::new_v4().to_string();
        let viewer = OpenViewer {
            owner: user_id.to_string(),
            state,
            last_access: Utc::now(),
        };
        self.inner.write().unwrap().insert(id.clone(), viewer);
        id
    }

    /// Snapshot of one of `user_id`'s panels.
    #[must_use]
    pub fn get(&self, viewer_id: &str, user_id: &str) -> Option<DocumentViewState> {
        self.inner
            .read()
            .unwrap()
            .get(viewer_id)
            .filter(|v| v.owner == user_id)
            .map(|v| v.state.clone())
    }

    /// Mutate one of `user_id`'s panels in place.
    ///
    /// Returns `None`, leaving every panel untouched, if the viewer is
    /// unknown or belongs to someone else.
    pub fn update<R>(
        &self,
        viewer_id: &str,
        user_id: &str,
        f: impl FnOnce(&mut DocumentViewState) -> R,
    ) -> Option<R> {
        let mut guard = self.inner.write().unwrap();
        let viewer = guard.get_mut(viewer_id).filter(|v| v.owner == user_id)?;
        viewer.last_access = Utc::now();
        Some(f(&mut viewer.state))
    }

    /// Close a panel.
    pub fn close(&self, viewer_id: &str) -> Option<DocumentViewState> {
        self.inner
            .write()
            .unwrap()
            .remove(viewer_id)
            .map(|v| v.state)
    }

    /// Close every panel showing `document_id`.
    pub fn close_document(&self, document_id: &str) -> usize {
        let mut guard = self.inner.write().unwrap();
        let before = guard.len();
        guard.retain(|_, v| v.state.document_id() != document_id);
        before - guard.len()
    }

    /// Number of open panels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Whether no panel is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close panels idle for longer than the default timeout.
    ///
    /// Returns the number closed.
    pub fn cleanup_idle(&self) -> usize {
        self.cleanup_idle_with_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// Close panels idle for longer than `timeout`.
    pub fn cleanup_idle_with_timeout(&self, timeout: Duration) -> usize {
        let idle: Vec<String> = self
            .inner
            .read()
            .unwrap()
            .iter()
            .filter(|(_, v)| v.is_idle_for(timeout))
            .map(|(id, _)| id.clone())
            .collect();
        idle.iter().filter_map(|id| self.close(id)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentContent, FileType, RenderSignal};

    fn image_state(document_id: &str) -> DocumentViewState {
        DocumentViewState::new(
            document_id,
            FileType::Image,
            DocumentContent::Url("/raw".into()),
        )
    }

    #[test]
    fn test_open_update_close() {
        let store = ViewerStore::new();
        let id = store.open("alice", image_state("doc"));

        let changed = store.update(&id, "alice", |s| s.on_ready(RenderSignal::ImageLoaded));
        assert_eq!(changed, Some(true));
        assert!(!store.get(&id, "alice").unwrap().is_loading());

        assert!(store.update("missing", "alice", |s| s.next_page()).is_none());
        assert_eq!(store.close_document("doc"), 1);
        assert!(store.get(&id, "alice").is_none());
    }

    #[test]
    fn test_other_users_cannot_touch_viewer() {
        let store = ViewerStore::new();
        let id = store.open("alice", image_state("doc"));

        assert!(store.get(&id, "bob").is_none());
        let switched = store.update(&id, "bob", |s| {
            s.reset_for("other", FileType::Image, DocumentContent::Url("/x".into()))
        });
        assert!(switched.is_none());

        assert_eq!(store.get(&id, "alice").unwrap().document_id(), "doc");
    }

    #[test]
    fn test_cleanup_idle_closes_stale_viewers() {
        let store = ViewerStore::new();
        let id = store.open("alice", image_state("doc"));
        assert_eq!(store.cleanup_idle_with_timeout(Duration::from_secs(60)), 0);

        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(store.cleanup_idle_with_timeout(Duration::from_millis(1)), 1);
        assert!(store.get(&id, "alice").is_none());
        assert!(store.is_empty());
    }
}
