use super::{fs_with, new_fs};
use crate::{CONTENT_TABLE, ENTRY_TABLE, ErrorKind, FsOptions};
use kvstore::MemoryBackend;

#[tokio::test]
async fn test_read_updates_access_time() {
    let (fs, _backend) = new_fs();
    fs.write_all("/f", "x").await.unwrap();
    assert_eq!(fs.stat("/f").await.unwrap().accessed, None);

    fs.read_text("/f").await.unwrap();
    assert!(fs.stat("/f").await.unwrap().accessed.is_some());
}

#[tokio::test]
async fn test_noatime() {
    let options = FsOptions::default().with_noatime(true);
    let (fs, _backend) = fs_with(MemoryBackend::new(), options);
    fs.write_all("/f", "x").await.unwrap();
    fs.read_text("/f").await.unwrap();
    assert_eq!(fs.stat("/f").await.unwrap().accessed, None);
}

#[tokio::test]
async fn test_access_time_failure_is_ignored() {
    let (fs, backend) = new_fs();
    fs.write_all("/f", "still readable").await.unwrap();

    backend.deny_writes(ENTRY_TABLE);
    assert_eq!(fs.read_text("/f").await.unwrap(), "still readable");
    backend.allow_writes(ENTRY_TABLE);

    assert_eq!(fs.stat("/f").await.unwrap().accessed, None);
}

#[tokio::test]
async fn test_entry_failure_after_content_commit() {
    let (fs, backend) = new_fs();
    fs.write_all("/f", "old").await.unwrap();

    backend.deny_writes(ENTRY_TABLE);
    let err = fs.write_all("/f", "newer").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoModificationAllowed);
    backend.allow_writes(ENTRY_TABLE);

    // Content is committed first, so it is ahead of the entry until a
    // read refreshes the size.
    assert_eq!(fs.stat("/f").await.unwrap().size, Some(3));
    assert_eq!(fs.read_text("/f").await.unwrap(), "newer");
    let stats = fs.stat("/f").await.unwrap();
    assert_eq!(stats.size, Some(5));
    assert!(stats.accessed.is_some());
}

#[tokio::test]
async fn test_content_failure_keeps_old_state() {
    let (fs, backend) = new_fs();
    fs.write_all("/f", "old").await.unwrap();

    backend.deny_writes(CONTENT_TABLE);
    let err = fs.write_all("/f", "newer").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoModificationAllowed);
    assert_eq!(err.path(), Some("/f"));

    let err = fs.remove("/f").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoModificationAllowed);
    backend.allow_writes(CONTENT_TABLE);

    assert_eq!(fs.read_text("/f").await.unwrap(), "old");
    assert_eq!(fs.stat("/f").await.unwrap().size, Some(3));
}

#[tokio::test]
async fn test_aborted_commit() {
    let (fs, backend) = new_fs();
    fs.open().await.unwrap();

    backend.abort_commits(CONTENT_TABLE);
    let err = fs.write_all("/f", "x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aborted);
    backend.resume_commits(CONTENT_TABLE);

    assert!(!fs.exists("/f").await.unwrap());
}

#[tokio::test]
async fn test_rename_is_atomic() {
    let (fs, backend) = new_fs();
    fs.mkdir("/a", false).await.unwrap();
    fs.write_all("/a/x", "1").await.unwrap();

    backend.abort_commits(ENTRY_TABLE);
    let err = fs.rename("/a", "/b").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aborted);
    backend.resume_commits(ENTRY_TABLE);

    assert_eq!(fs.read_text("/a/x").await.unwrap(), "1");
    assert!(!fs.exists("/b").await.unwrap());
}

#[tokio::test]
async fn test_noatime_leaves_stale_size() {
    let options = FsOptions::default().with_noatime(true);
    let (fs, backend) = fs_with(MemoryBackend::new(), options);
    fs.write_all("/f", "old").await.unwrap();

    backend.deny_writes(ENTRY_TABLE);
    fs.write_all("/f", "newer").await.unwrap_err();
    backend.allow_writes(ENTRY_TABLE);

    assert_eq!(fs.read_text("/f").await.unwrap(), "newer");
    assert_eq!(fs.stat("/f").await.unwrap().size, Some(3));
}

#[tokio::test]
async fn test_unrepresentable_offset() {
    let (fs, _backend) = new_fs();
    fs.write_all("/f", "abc").await.unwrap();

    let err = fs.write_at("/f", u64::MAX, "x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationError);

    let err = fs.write_at("/f", 1 << 62, "x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationError);

    assert_eq!(fs.read_text("/f").await.unwrap(), "abc");
    assert_eq!(fs.stat("/f").await.unwrap().size, Some(3));
}

#[tokio::test]
async fn test_stream_seek_past_representable_offset() {
    let (fs, _backend) = new_fs();
    fs.write_all("/f", "abc").await.unwrap();

    let options = crate::WriteOptions {
        append: true,
        create: false,
    };
    let mut ws = fs.create_write_stream("/f", options).await.unwrap();
    ws.seek(std::io::SeekFrom::Start(u64::MAX)).await.unwrap();
    let err = ws.write("x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationError);
    assert_eq!(fs.read_text("/f").await.unwrap(), "abc");
}
