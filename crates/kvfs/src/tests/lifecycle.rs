use super::{REPO, fs_with, new_fs};
use crate::{ErrorKind, FsOptions, SCRATCH_TABLE};
use kvstore::{DbEvent, MemoryBackend};
use std::time::Duration;

#[tokio::test]
async fn test_lazy_open() {
    let (fs, _backend) = new_fs();
    assert!(!fs.is_open().await);
    fs.exists("/").await.unwrap();
    assert!(fs.is_open().await);

    fs.dispose().await;
    assert!(!fs.is_open().await);
    assert!(fs.exists("/").await.unwrap());
}

#[tokio::test]
async fn test_blocked_open() {
    let options = FsOptions::default().with_open_timeout(Duration::from_millis(50));
    let (fs, backend) = fs_with(MemoryBackend::new(), options);

    let blocker = backend.block_opens().await;
    let err = fs.stat("/").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Blocked);
    assert!(!fs.is_open().await);

    drop(blocker);
    assert!(fs.stat("/").await.unwrap().is_directory());
}

#[tokio::test]
async fn test_reopens_after_error_event() {
    let (fs, backend) = new_fs();
    fs.write_all("/f", "x").await.unwrap();
    assert_eq!(backend.put_count(REPO, SCRATCH_TABLE), 1);

    backend.emit_event(DbEvent::Error("disk went away".into()));
    assert_eq!(fs.read_text("/f").await.unwrap(), "x");
    assert_eq!(backend.put_count(REPO, SCRATCH_TABLE), 2);

    backend.emit_event(DbEvent::Abort("quota".into()));
    fs.open().await.unwrap();
    assert_eq!(backend.put_count(REPO, SCRATCH_TABLE), 3);

    fs.open().await.unwrap();
    assert_eq!(backend.put_count(REPO, SCRATCH_TABLE), 3);
}

#[tokio::test]
async fn test_root_recreated_when_missing() {
    let (fs, backend) = new_fs();
    fs.remove_entry("/", false).await.unwrap();
    assert_eq!(fs.stat("/").await.unwrap_err().kind(), ErrorKind::NotFound);

    backend.emit_event(DbEvent::Closed);
    assert!(fs.stat("/").await.unwrap().is_directory());
}

#[test]
fn test_invalid_options_rejected() {
    let options = FsOptions {
        read_chunk_size: 0,
        ..Default::default()
    };
    let err = crate::KvFs::new(
        std::sync::Arc::new(MemoryBackend::new()),
        REPO,
        options,
    )
    .err()
    .unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}
