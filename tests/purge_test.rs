// Purge service tests — full sweep, idempotence, tolerance of stray entries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use picbundle::engine::purge::purge;
use picbundle::engine::session::{Session, SessionStore};
use picbundle::error::Error;

fn make_session(id: &str, staging_path: PathBuf) -> Arc<Session> {
    Arc::new(Session {
        id: id.to_string(),
        query: "fox".to_string(),
        staging_path,
        images: vec![],
        created_at: Instant::now(),
    })
}

#[test]
fn test_purge_sweeps_archives_staging_and_store() {
    let archive_dir = tempfile::tempdir().unwrap();
    let staging_root = tempfile::tempdir().unwrap();

    std::fs::write(archive_dir.path().join("fox_s1_selected.zip"), b"zip1").unwrap();
    std::fs::write(archive_dir.path().join("cat_s2_selected.ZIP"), b"zip2").unwrap();
    std::fs::write(archive_dir.path().join("notes.txt"), b"keep me").unwrap();

    let s1 = staging_root.path().join("s1");
    let s2 = staging_root.path().join(".s3.part");
    std::fs::create_dir_all(&s1).unwrap();
    std::fs::create_dir_all(&s2).unwrap();
    std::fs::write(s1.join("a.jpg"), b"a").unwrap();
    std::fs::write(staging_root.path().join("stray.log"), b"x").unwrap();

    let store = SessionStore::new();
    store.put(make_session("s1", s1.clone()));

    let report = purge(archive_dir.path(), staging_root.path(), &store).unwrap();

    assert_eq!(report.archives_removed, 2);
    assert_eq!(report.staging_dirs_removed, 2);
    assert_eq!(report.failures, 0);

    // Non-zip files and stray regular files in the staging root survive.
    assert!(archive_dir.path().join("notes.txt").is_file());
    assert!(staging_root.path().join("stray.log").is_file());
    assert!(!s1.exists());
    assert!(!s2.exists());
    assert!(store.is_empty());
}

#[test]
fn test_purge_is_idempotent() {
    let archive_dir = tempfile::tempdir().unwrap();
    let staging_root = tempfile::tempdir().unwrap();

    std::fs::write(archive_dir.path().join("a.zip"), b"z").unwrap();
    std::fs::create_dir_all(staging_root.path().join("s1")).unwrap();
    let store = SessionStore::new();
    store.put(make_session("s1", staging_root.path().join("s1")));

    let first = purge(archive_dir.path(), staging_root.path(), &store).unwrap();
    assert_eq!(first.archives_removed, 1);
    assert_eq!(first.staging_dirs_removed, 1);

    // A second purge with nothing left still succeeds and removes nothing.
    let second = purge(archive_dir.path(), staging_root.path(), &store).unwrap();
    assert_eq!(second.archives_removed, 0);
    assert_eq!(second.staging_dirs_removed, 0);
    assert_eq!(second.failures, 0);

    assert_eq!(std::fs::read_dir(archive_dir.path()).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(staging_root.path()).unwrap().count(), 0);
}

#[test]
fn test_purge_missing_root_is_io_error() {
    let archive_dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new();

    let err = purge(
        archive_dir.path(),
        std::path::Path::new("/nonexistent/picbundle-staging"),
        &store,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
