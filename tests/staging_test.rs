// Staging manager tests with stub image sources.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use picbundle::engine::staging::StagingManager;
use picbundle::error::{Error, Result};
use picbundle::source::traits::ImageSource;

/// Writes a fixed set of files into the destination, respecting `limit`.
struct StubSource {
    files: Vec<(&'static str, &'static [u8])>,
}

#[async_trait]
impl ImageSource for StubSource {
    async fn fetch_into(&self, _query: &str, limit: usize, dest: &Path) -> Result<usize> {
        let mut written = 0;
        for (name, bytes) in self.files.iter().take(limit) {
            tokio::fs::write(dest.join(name), bytes).await?;
            written += 1;
        }
        Ok(written)
    }
}

/// Always reports zero results.
struct EmptySource;

#[async_trait]
impl ImageSource for EmptySource {
    async fn fetch_into(&self, _query: &str, _limit: usize, _dest: &Path) -> Result<usize> {
        Ok(0)
    }
}

/// Fails after leaving a partial download behind.
struct FailingSource;

#[async_trait]
impl ImageSource for FailingSource {
    async fn fetch_into(&self, _query: &str, _limit: usize, dest: &Path) -> Result<usize> {
        tokio::fs::write(dest.join("Image_1.jpg"), b"partial").await?;
        Err(Error::upstream("provider timed out"))
    }
}

fn subdir_count(root: &Path) -> usize {
    std::fs::read_dir(root)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().is_dir())
        .count()
}

#[tokio::test]
async fn test_stage_enumerates_allowlisted_sorted() {
    let root = tempfile::tempdir().unwrap();
    let source = StubSource {
        files: vec![
            ("b.JPG", b"bbb".as_slice()),
            ("a.png", b"aaa".as_slice()),
            ("notes.txt", b"log".as_slice()),
            ("partial.jpg.part", b"x".as_slice()),
        ],
    };
    let staging = StagingManager::new(root.path(), Arc::new(source));

    let session = staging.stage("red fox", 10).await.unwrap();

    assert_eq!(session.query, "red fox");
    assert_eq!(session.staging_path, root.path().join(&session.id));
    assert!(session.staging_path.is_dir());

    // Only allow-listed extensions, sorted by filename.
    let names: Vec<&str> = session.images.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.JPG"]);
    assert_eq!(
        session.images[0].url,
        format!("/image/{}/a.png", session.id)
    );

    // Excluded files are left on disk, not deleted.
    assert!(session.staging_path.join("notes.txt").is_file());
    assert!(session.staging_path.join("partial.jpg.part").is_file());
}

#[tokio::test]
async fn test_stage_respects_limit() {
    let root = tempfile::tempdir().unwrap();
    let source = StubSource {
        files: vec![
            ("Image_1.jpg", b"1".as_slice()),
            ("Image_2.jpg", b"2".as_slice()),
            ("Image_3.jpg", b"3".as_slice()),
        ],
    };
    let staging = StagingManager::new(root.path(), Arc::new(source));

    let session = staging.stage("fox", 2).await.unwrap();
    assert_eq!(session.images.len(), 2);
}

#[tokio::test]
async fn test_stage_zero_results_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let staging = StagingManager::new(root.path(), Arc::new(EmptySource));

    let err = staging.stage("nonexistent", 5).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // No staging directory (not even a partial one) is left behind.
    assert_eq!(subdir_count(root.path()), 0);
}

#[tokio::test]
async fn test_stage_source_failure_cleans_partial_dir() {
    let root = tempfile::tempdir().unwrap();
    let staging = StagingManager::new(root.path(), Arc::new(FailingSource));

    let err = staging.stage("fox", 5).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
    assert_eq!(subdir_count(root.path()), 0);
}

#[tokio::test]
async fn test_stage_same_query_gets_distinct_dirs() {
    let root = tempfile::tempdir().unwrap();
    let source = Arc::new(StubSource {
        files: vec![("Image_1.jpg", b"1".as_slice())],
    });
    let staging = StagingManager::new(root.path(), source);

    let first = staging.stage("fox", 1).await.unwrap();
    let second = staging.stage("fox", 1).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_ne!(first.staging_path, second.staging_path);
    assert!(first.staging_path.is_dir());
    assert!(second.staging_path.is_dir());
}
