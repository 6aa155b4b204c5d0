//! Reading and writing file contents.
//!
//! Every write is a whole-payload replacement: appends and positional
//! writes read the current payload, splice the new bytes in, and save the
//! result. The content record is committed before the entry record, so a
//! failure between the two leaves new content under old metadata, never
//! metadata describing content that is not there.

use crate::connection::{CONTENT_TABLE, ConnectionManager, ENTRY_TABLE};
use crate::content::{self, ContentTable};
use crate::convert::Source;
use crate::encoding::Payload;
use crate::entry::{self, EntryTable};
use crate::error::{Error, Result};
use crate::path;
use crate::stats::{Stats, StatsPatch, now_millis};
use diagnostics::*;
use kvstore::TxMode;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Add to the end of the current contents instead of replacing them
    pub append: bool,
    /// Create the file when it does not exist
    pub create: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            append: false,
            create: true,
        }
    }
}

impl SaveOptions {
    #[must_use]
    pub fn append() -> Self {
        Self {
            append: true,
            ..Default::default()
        }
    }
}

/// Result of a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Entry record as stored after the write
    pub stats: Stats,
    /// Bytes taken from the caller's data
    pub written: u64,
}

#[derive(Clone)]
pub struct ContentEngine {
    connections: Arc<ConnectionManager>,
    entries: EntryTable,
    contents: ContentTable,
    noatime: bool,
}

impl ContentEngine {
    pub fn new(
        connections: Arc<ConnectionManager>,
        entries: EntryTable,
        contents: ContentTable,
        noatime: bool,
    ) -> Self {
        Self {
            connections,
            entries,
            contents,
            noatime,
        }
    }

    /// Payload of the file at `path`, updating its access time.
    pub async fn load(&self, path: &str) -> Result<Payload> {
        let payload = self.load_quiet(path).await?;
        if !self.noatime {
            self.touch(path, payload.len() as u64).await;
        }
        Ok(payload)
    }

    pub async fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let payload = self.load(path).await?;
        decode(path, payload)
    }

    /// Write `source` to the file at `path`.
    pub async fn save(&self, path: &str, source: Source, options: SaveOptions) -> Result<SaveOutcome> {
        let existing = self.writable(path, options.create).await?;
        let data = source
            .into_bytes()
            .map_err(|e| Error::conversion(path, e))?;
        let written = data.len() as u64;

        let bytes = match &existing {
            Some(_) if options.append => {
                let mut prior = self.current_bytes(path).await?;
                prior.extend_from_slice(&data);
                prior
            }
            _ => data,
        };

        let stats = self.store(path, bytes, existing).await?;
        Ok(SaveOutcome { stats, written })
    }

    /// Overwrite the bytes at `offset`, zero-filling any gap past the end.
    pub async fn write_at(
        &self,
        path: &str,
        offset: u64,
        source: Source,
        create: bool,
    ) -> Result<SaveOutcome> {
        let existing = self.writable(path, create).await?;
        let data = source
            .into_bytes()
            .map_err(|e| Error::conversion(path, e))?;
        let offset = usize::try_from(offset)
            .map_err(|_| Error::operation(path, format!("offset {offset} out of range")))?;

        let current = match &existing {
            Some(_) => self.current_bytes(path).await?,
            None => Vec::new(),
        };
        let end = offset
            .checked_add(data.len())
            .ok_or_else(|| Error::operation(path, "offset out of range"))?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(end.max(current.len()))
            .map_err(|e| Error::operation(path, format!("offset out of range: {e}")))?;
        bytes.extend_from_slice(&current[..offset.min(current.len())]);
        bytes.resize(offset, 0);
        bytes.extend_from_slice(&data);
        if end < current.len() {
            bytes.extend_from_slice(&current[end..]);
        }

        let written = data.len() as u64;
        let stats = self.store(path, bytes, existing).await?;
        Ok(SaveOutcome { stats, written })
    }

    /// Shorten the file to `size` bytes. Never lengthens it.
    pub async fn truncate(&self, path: &str, size: u64) -> Result<Stats> {
        let Some(stats) = self.writable(path, false).await? else {
            return Err(Error::not_found(path));
        };
        let mut bytes = self.current_bytes(path).await?;
        let size = usize::try_from(size).unwrap_or(usize::MAX);
        if size >= bytes.len() {
            return Ok(stats);
        }
        bytes.truncate(size);
        self.store(path, bytes, Some(stats)).await
    }

    /// Delete the file's content, then its entry.
    pub async fn remove(&self, path: &str) -> Result<()> {
        let stats = self.entries.get(path).await?;
        if stats.is_directory() {
            return Err(Error::type_mismatch(path, "is a directory"));
        }
        self.contents.delete(path).await?;
        self.entries.remove(path, true).await
    }

    /// Read the payload without touching the access time.
    pub(crate) async fn load_quiet(&self, path: &str) -> Result<Payload> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE, CONTENT_TABLE], TxMode::ReadOnly)
            .await
            .map_err(|e| Error::read(path, e))?;

        let stats = entry::get_in(tx.as_mut(), path)
            .await?
            .ok_or_else(|| Error::not_found(path))?;
        if stats.is_directory() {
            return Err(Error::type_mismatch(path, "is a directory"));
        }
        let payload = content::get_in(tx.as_mut(), path)
            .await?
            .ok_or_else(|| Error::not_found(path))?;
        tx.commit().await.map_err(|e| Error::read(path, e))?;
        Ok(payload)
    }

    /// Record the access and the size actually read.
    async fn touch(&self, path: &str, size: u64) {
        let patch = StatsPatch {
            accessed: Some(now_millis()),
            size: Some(size),
            ..Default::default()
        };
        if let Err(e) = self.entries.patch(path, &patch).await {
            let error = e.to_string();
            warn!(
                "Failed to update access time of {path}: {error}",
                path: path,
                error: error
            );
        }
    }

    /// Current entry of a file about to be written.
    ///
    /// Fails for a directory. A missing file is `None` when `create`
    /// allows it and its parent directory exists.
    async fn writable(&self, path: &str, create: bool) -> Result<Option<Stats>> {
        match self.entries.try_get(path).await? {
            Some(stats) if stats.is_directory() => {
                Err(Error::type_mismatch(path, "is a directory"))
            }
            Some(stats) => Ok(Some(stats)),
            None if !create => Err(Error::not_found(path)),
            None => {
                let parent = path::parent(path).ok_or_else(|| Error::invalid_path(path))?;
                match self.entries.try_get(parent).await? {
                    Some(dir) if dir.is_directory() => Ok(None),
                    Some(_) => Err(Error::type_mismatch(parent, "not a directory")),
                    None => Err(Error::not_found(parent)),
                }
            }
        }
    }

    async fn current_bytes(&self, path: &str) -> Result<Vec<u8>> {
        match self.contents.try_get(path).await? {
            Some(payload) => decode(path, payload),
            None => Ok(Vec::new()),
        }
    }

    async fn store(&self, path: &str, bytes: Vec<u8>, existing: Option<Stats>) -> Result<Stats> {
        let payload = self.contents.put(path, bytes).await?;
        let size = payload.len() as u64;
        let now = now_millis();
        let stats = match existing {
            Some(mut stats) => {
                stats.modified = now;
                stats.size = Some(size);
                stats
            }
            None => Stats::file(now, size),
        };
        if let Err(e) = self.entries.put(path, &stats).await {
            let error = e.to_string();
            error!(
                "Stored content of {path} but not its entry: {error}",
                path: path,
                error: error
            );
            return Err(e);
        }
        Ok(stats)
    }
}

fn decode(path: &str, payload: Payload) -> Result<Vec<u8>> {
    payload
        .into_bytes()
        .ok_or_else(|| Error::operation(path, "stored string is not a binary string"))
}
