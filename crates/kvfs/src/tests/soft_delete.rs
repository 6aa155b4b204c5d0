use super::{REPO, fs_with};
use crate::{CONTENT_TABLE, DeleteMode, ENTRY_TABLE, ErrorKind, FsOptions};
use kvstore::MemoryBackend;

fn soft_options() -> FsOptions {
    FsOptions::default().with_delete_mode(DeleteMode::Soft)
}

fn raw_entry(backend: &MemoryBackend, path: &str) -> Option<serde_json::Value> {
    backend
        .raw_entries(REPO, ENTRY_TABLE)
        .into_iter()
        .find(|(key, _)| key == path)
        .and_then(|(_, value)| value.as_record().cloned())
}

#[tokio::test]
async fn test_soft_delete_leaves_tombstone() {
    let (fs, backend) = fs_with(MemoryBackend::new(), soft_options());
    fs.write_all("/f", "data").await.unwrap();
    fs.remove("/f").await.unwrap();

    assert_eq!(fs.stat("/f").await.unwrap_err().kind(), ErrorKind::NotFound);
    assert!(!fs.exists("/f").await.unwrap());
    assert!(fs.list("/").await.unwrap().is_empty());
    assert!(backend.raw_entries(REPO, CONTENT_TABLE).is_empty());

    let record = raw_entry(&backend, "/f").unwrap();
    assert!(record.get("deleted").is_some());
    assert_eq!(record.get("size"), Some(&serde_json::json!(4)));
}

#[tokio::test]
async fn test_recreate_over_tombstone() {
    let (fs, backend) = fs_with(MemoryBackend::new(), soft_options());
    fs.mkdir("/d", false).await.unwrap();
    fs.rmdir("/d", false).await.unwrap();
    assert!(raw_entry(&backend, "/d").is_some());

    fs.mkdir("/d", false).await.unwrap();
    assert!(!fs.stat("/d").await.unwrap().is_deleted());

    fs.write_all("/d/f", "1").await.unwrap();
    fs.remove("/d/f").await.unwrap();
    fs.write_all("/d/f", "2").await.unwrap();
    let stats = fs.stat("/d/f").await.unwrap();
    assert!(!stats.is_deleted());
    assert_eq!(fs.read_text("/d/f").await.unwrap(), "2");
}

#[tokio::test]
async fn test_remove_entry_leniency() {
    let (fs, _backend) = fs_with(MemoryBackend::new(), soft_options());
    fs.mkdir("/d", false).await.unwrap();
    fs.remove_entry("/d", false).await.unwrap();

    let err = fs.remove_entry("/d", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    fs.remove_entry("/d", true).await.unwrap();
}

#[tokio::test]
async fn test_hard_delete_removes_record() {
    let (fs, backend) = fs_with(MemoryBackend::new(), FsOptions::default());
    fs.write_all("/f", "data").await.unwrap();
    fs.remove("/f").await.unwrap();
    assert!(raw_entry(&backend, "/f").is_none());

    let err = fs.remove_entry("/f", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    fs.remove_entry("/f", true).await.unwrap();
}

#[tokio::test]
async fn test_patch_skips_tombstone() {
    let (fs, _backend) = fs_with(MemoryBackend::new(), soft_options());
    fs.write_all("/f", "data").await.unwrap();
    fs.remove("/f").await.unwrap();
    let err = fs
        .patch_entry("/f", &crate::StatsPatch::accessed(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
