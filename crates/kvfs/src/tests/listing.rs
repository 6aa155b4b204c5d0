use super::new_fs;
use crate::ErrorKind;

#[tokio::test]
async fn test_list_direct_children_only() {
    let (fs, _backend) = new_fs();
    fs.mkdir("/a/b/c", true).await.unwrap();
    fs.mkdir("/ab", false).await.unwrap();
    fs.mkdir("/a-b", false).await.unwrap();
    fs.write_all("/a/z.txt", "z").await.unwrap();
    fs.write_all("/a/b/c/deep.txt", "deep").await.unwrap();

    assert_eq!(fs.list("/a").await.unwrap(), vec!["/a/b", "/a/z.txt"]);
    assert_eq!(fs.list("/a/b").await.unwrap(), vec!["/a/b/c"]);
    assert_eq!(fs.list("/a/b/c").await.unwrap(), vec!["/a/b/c/deep.txt"]);
    assert_eq!(fs.list("/").await.unwrap(), vec!["/a", "/a-b", "/ab"]);
}

#[tokio::test]
async fn test_list_file_is_type_mismatch() {
    let (fs, _backend) = new_fs();
    fs.write_all("/file.txt", "x").await.unwrap();
    let err = fs.list("/file.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[tokio::test]
async fn test_list_after_removal() {
    let (fs, _backend) = new_fs();
    fs.mkdir("/d", false).await.unwrap();
    fs.write_all("/d/one", "1").await.unwrap();
    fs.write_all("/d/two", "2").await.unwrap();
    fs.remove("/d/one").await.unwrap();
    assert_eq!(fs.list("/d").await.unwrap(), vec!["/d/two"]);
}

#[tokio::test]
async fn test_file_beside_directory_of_same_stem() {
    let (fs, _backend) = new_fs();
    fs.write_all("/a.txt", "abcd").await.unwrap();
    assert_eq!(fs.list("/").await.unwrap(), vec!["/a.txt"]);

    fs.mkdir("/a", false).await.unwrap();
    fs.write_all("/a/b.txt", "b").await.unwrap();
    assert_eq!(fs.list("/").await.unwrap(), vec!["/a", "/a.txt"]);
    assert_eq!(fs.list("/a").await.unwrap(), vec!["/a/b.txt"]);
}
