//! Path helpers and the key ranges used for directory scans.
//!
//! Paths are absolute and normalized: they start with `/`, the root is
//! exactly `/`, and no other path ends with `/`. Keys in the entry table
//! are these paths verbatim, so the children of a directory are the keys
//! in `[dir + "/", dir + "0")` (`'0'` is the character right after `'/'`)
//! whose depth is one more than the directory's.

use crate::error::{Error, Result};
use kvstore::KeyRange;

pub const ROOT: &str = "/";

/// Normalize a caller-supplied path.
///
/// Trailing and repeated separators are dropped. Relative paths and `.`
/// or `..` segments are rejected.
pub fn normalize(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(Error::invalid_path(path));
    }
    let mut normalized = String::with_capacity(path.len());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(Error::invalid_path(path));
        }
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    Ok(normalized)
}

#[must_use]
pub fn is_root(path: &str) -> bool {
    path == ROOT
}

#[must_use]
pub fn slash_count(path: &str) -> usize {
    path.bytes().filter(|b| *b == b'/').count()
}

/// Depth of the keys directly under `dir`
#[must_use]
pub fn child_depth(dir: &str) -> usize {
    if is_root(dir) { 1 } else { slash_count(dir) + 1 }
}

/// Key range holding every descendant of `dir`
#[must_use]
pub fn descendant_range(dir: &str) -> KeyRange {
    if is_root(dir) {
        KeyRange::half_open("/", "0")
    } else {
        KeyRange::half_open(format!("{dir}/"), format!("{dir}0"))
    }
}

#[must_use]
pub fn is_direct_child(dir: &str, key: &str) -> bool {
    key != dir && descendant_range(dir).contains(key) && slash_count(key) == child_depth(dir)
}

/// Parent directory, `None` for the root
#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

/// True when `path` is `ancestor` or lies below it.
#[must_use]
pub fn is_within(ancestor: &str, path: &str) -> bool {
    path == ancestor || descendant_range(ancestor).contains(path)
}

/// Move `path` from under `from` to under `to`.
#[must_use]
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    let rest = path.strip_prefix(from).unwrap_or(path);
    if is_root(to) {
        rest.to_string()
    } else {
        format!("{to}{rest}")
    }
}
