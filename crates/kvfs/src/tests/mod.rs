mod failures;
mod lifecycle;
mod listing;
mod soft_delete;
mod streaming;

use crate::{FsOptions, KvFs};
use kvstore::MemoryBackend;
use std::sync::Arc;

pub(crate) const REPO: &str = "kvfs-test";

/// Filesystem over a fresh in-memory backend, with the backend kept for
/// inspection and fault injection.
pub(crate) fn new_fs() -> (KvFs, MemoryBackend) {
    fs_with(MemoryBackend::new(), FsOptions::default())
}

pub(crate) fn fs_with(backend: MemoryBackend, options: FsOptions) -> (KvFs, MemoryBackend) {
    diagnostics::init();
    let fs = KvFs::new(Arc::new(backend.clone()), REPO, options).unwrap();
    (fs, backend)
}
