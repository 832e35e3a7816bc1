// Session records and the in-process store that owns them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;

/// One staged image: the on-disk filename plus the URL a browser fetches it from.
#[derive(Debug, Clone, Serialize)]
pub struct ImageEntry {
    pub filename: String,
    pub url: String,
}

/// One generation request and its staged results. Immutable once built;
/// shared as `Arc<Session>` between the store and in-flight handlers.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub query: String,
    pub staging_path: PathBuf,
    pub images: Vec<ImageEntry>,
    pub created_at: Instant,
}

/// In-process session map. Lives for the process lifetime; entries only
/// leave through replacement, removal, or a full clear. Sessions are built
/// completely before insertion, so a reader never sees a half-written one.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `session.id`.
    pub fn put(&self, session: Arc<Session>) {
        self.inner.write().insert(session.id.clone(), session);
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.inner.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.inner.write().remove(id)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Snapshot of all live sessions (used by the expiry sweeper).
    pub fn all(&self) -> Vec<Arc<Session>> {
        self.inner.read().values().cloned().collect()
    }
}

/// Whether `name` is a plain filename safe to join under a session directory.
/// Rejects anything with path separators or dot components, so a request can
/// never address a file outside its own staging directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && name != "." && name != ".."
}
