use super::{fs_with, new_fs};
use crate::{ErrorKind, FsOptions, Source, SourceType, WriteOptions};
use kvstore::MemoryBackend;
use std::io::SeekFrom;

fn text(chunk: Option<Vec<u8>>) -> String {
    String::from_utf8(chunk.unwrap()).unwrap()
}

#[tokio::test]
async fn test_continuous_read_and_write() {
    let (fs, _backend) = new_fs();

    let mut ws = fs
        .create_write_stream("/otani.txt", WriteOptions::default())
        .await
        .unwrap();
    ws.write("大谷").await.unwrap();
    ws.write("翔平").await.unwrap();

    let mut rs = fs.create_read_stream("/otani.txt").await.unwrap();
    assert_eq!(text(rs.read(Some(6)).await.unwrap()), "大谷");
    rs.seek(SeekFrom::Start(6)).await.unwrap();
    assert_eq!(text(rs.read(Some(6)).await.unwrap()), "翔平");

    assert_eq!(ws.seek(SeekFrom::End(0)).await.unwrap(), 12);
    ws.write("ホームラン").await.unwrap();

    rs.seek(SeekFrom::Start(0)).await.unwrap();
    assert_eq!(text(rs.read(None).await.unwrap()), "大谷翔平ホームラン");

    rs.seek(SeekFrom::Start(0)).await.unwrap();
    assert_eq!(text(rs.read(Some(6)).await.unwrap()), "大谷");
    assert_eq!(rs.seek(SeekFrom::Current(6)).await.unwrap(), 12);
    assert_eq!(text(rs.read(None).await.unwrap()), "ホームラン");
    assert_eq!(rs.read(None).await.unwrap(), None);

    ws.close();
    rs.close();
}

#[tokio::test]
async fn test_write_stream_truncates_first() {
    let (fs, _backend) = new_fs();
    fs.write_all("/f", "previous contents").await.unwrap();

    let mut ws = fs
        .create_write_stream("/f", WriteOptions::default())
        .await
        .unwrap();
    ws.write("new").await.unwrap();
    assert_eq!(fs.read_text("/f").await.unwrap(), "new");
}

#[tokio::test]
async fn test_append_stream() {
    let (fs, _backend) = new_fs();
    fs.write_all("/log", "one\n").await.unwrap();

    let options = WriteOptions {
        append: true,
        create: true,
    };
    let mut ws = fs.create_write_stream("/log", options).await.unwrap();
    ws.write("two\n").await.unwrap();
    assert_eq!(ws.position(), 8);
    assert_eq!(fs.read_text("/log").await.unwrap(), "one\ntwo\n");

    ws.truncate(4).await.unwrap();
    assert_eq!(ws.position(), 4);
    ws.write("three\n").await.unwrap();
    assert_eq!(fs.read_text("/log").await.unwrap(), "one\nthree\n");
}

#[tokio::test]
async fn test_read_in_chunks() {
    let options = FsOptions {
        read_chunk_size: 4,
        ..Default::default()
    };
    let (fs, _backend) = fs_with(MemoryBackend::new(), options);
    fs.write_all("/f", "abcdefghij").await.unwrap();

    let mut rs = fs.create_read_stream("/f").await.unwrap();
    let mut chunks = Vec::new();
    while let Some(chunk) = rs.read(None).await.unwrap() {
        chunks.push(String::from_utf8(chunk).unwrap());
    }
    assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);

    rs.seek(SeekFrom::End(-2)).await.unwrap();
    let tail = rs.read_as(None, SourceType::Text).await.unwrap();
    assert_eq!(tail, Some(Source::Text("ij".into())));

    let err = rs.seek(SeekFrom::Current(-100)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationError);
}

#[tokio::test]
async fn test_stream_targets() {
    let (fs, _backend) = new_fs();
    fs.mkdir("/dir", false).await.unwrap();

    let err = fs.create_read_stream("/dir").await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    let err = fs.create_read_stream("/missing").await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fs
        .create_write_stream("/dir", WriteOptions::default())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let no_create = WriteOptions {
        append: false,
        create: false,
    };
    let err = fs
        .create_write_stream("/missing", no_create)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
