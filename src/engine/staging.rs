// Staging manager — runs the retriever into a request-scoped directory and
// publishes the result as an immutable session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::session::{ImageEntry, Session};
use crate::config::IMAGE_EXTENSIONS;
use crate::error::{Error, Result};
use crate::source::traits::ImageSource;

pub struct StagingManager {
    root: PathBuf,
    source: Arc<dyn ImageSource>,
}

impl StagingManager {
    pub fn new(root: impl Into<PathBuf>, source: Arc<dyn ImageSource>) -> Self {
        Self {
            root: root.into(),
            source,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Download images for `query` and stage them under a fresh session
    /// directory. The retriever writes into a hidden `.part` directory that
    /// is renamed into place only on success, so the published path is never
    /// observable half-populated.
    pub async fn stage(&self, query: &str, limit: usize) -> Result<Session> {
        let id = new_session_id();
        let staging_path = self.root.join(&id);

        // Id collision is vanishingly unlikely with the uuid suffix, but if
        // it happens the old directory loses: last writer wins, no merge.
        if staging_path.exists() {
            warn!("session id collision, replacing staging dir id={}", id);
            fs::remove_dir_all(&staging_path)?;
        }

        let work_dir = self.root.join(format!(".{}.part", id));
        fs::create_dir_all(&work_dir)?;

        info!("downloading up to {} image(s) for query \"{}\"", limit, query);
        let fetched = match self.source.fetch_into(query, limit, &work_dir).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_dir_all(&work_dir);
                return Err(e);
            }
        };

        if fetched == 0 {
            let _ = fs::remove_dir_all(&work_dir);
            return Err(Error::not_found(format!("no images found for \"{}\"", query)));
        }

        fs::rename(&work_dir, &staging_path)?;

        let images = enumerate_images(&staging_path, &id)?;
        info!(
            "session {} staged with {} image(s) at {}",
            id,
            images.len(),
            staging_path.display()
        );

        Ok(Session {
            id,
            query: query.to_string(),
            staging_path,
            images,
            created_at: Instant::now(),
        })
    }
}

/// Timestamp-prefixed id with a uuid suffix, e.g. `20260824_153000_9f2c41aa`.
fn new_session_id() -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", stamp, &suffix[..8])
}

/// List the allow-listed image files in `dir`, sorted by filename. Other
/// files (provider logs, partial downloads) are left on disk but excluded.
fn enumerate_images(dir: &Path, session_id: &str) -> Result<Vec<ImageEntry>> {
    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if has_image_extension(&name) {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|filename| ImageEntry {
            url: format!("/image/{}/{}", session_id, filename),
            filename,
        })
        .collect())
}

pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
