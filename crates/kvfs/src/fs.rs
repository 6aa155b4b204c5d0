use crate::config::FsOptions;
use crate::connection::{CONTENT_TABLE, ConnectionManager, ENTRY_TABLE};
use crate::content::ContentTable;
use crate::convert::{self, Source, SourceType};
use crate::encoding::{Payload, PayloadEncoding};
use crate::engine::{ContentEngine, SaveOptions, SaveOutcome};
use crate::entry::{self, EntryTable};
use crate::error::{Error, Result};
use crate::path;
use crate::scan::DirectoryScanner;
use crate::stats::{Stats, StatsPatch, now_millis};
use crate::stream::{ReadStream, WriteOptions, WriteStream};
use bytes::Bytes;
use diagnostics::*;
use kvstore::{Backend, Cursor, TxMode};
use std::sync::Arc;

/// Kind of object URL requested from [`KvFs::to_url`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

/// In-process handle to a file's contents, addressable by `url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrl {
    pub url: String,
    pub object: Bytes,
}

/// A filesystem stored in one database of a key-value backend.
///
/// Paths passed in are normalized first, so `/folder/` and `/folder`
/// name the same directory.
pub struct KvFs {
    repository: String,
    options: FsOptions,
    connections: Arc<ConnectionManager>,
    entries: EntryTable,
    scanner: DirectoryScanner,
    engine: ContentEngine,
}

impl KvFs {
    pub fn new(backend: Arc<dyn Backend>, repository: &str, options: FsOptions) -> Result<Self> {
        options.validate()?;
        let connections = Arc::new(ConnectionManager::new(
            backend,
            repository,
            options.open_timeout(),
        ));
        let entries = EntryTable::new(
            Arc::clone(&connections),
            entry::strategy_for(options.delete_mode),
        );
        let contents = ContentTable::new(Arc::clone(&connections));
        let scanner = DirectoryScanner::new(Arc::clone(&connections));
        let engine = ContentEngine::new(
            Arc::clone(&connections),
            entries.clone(),
            contents,
            options.noatime,
        );
        Ok(Self {
            repository: repository.to_string(),
            options,
            connections,
            entries,
            scanner,
            engine,
        })
    }

    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    #[must_use]
    pub fn options(&self) -> &FsOptions {
        &self.options
    }

    /// Open the connection now rather than on first use.
    pub async fn open(&self) -> Result<PayloadEncoding> {
        Ok(self.connections.connect().await?.encoding())
    }

    /// Close the connection. The next operation opens a new one.
    pub async fn dispose(&self) {
        self.connections.dispose().await;
    }

    pub async fn is_open(&self) -> bool {
        self.connections.is_open().await
    }

    // Entries

    pub async fn stat(&self, path: &str) -> Result<Stats> {
        let path = path::normalize(path)?;
        self.entries.get(&path).await
    }

    /// Same as [`Self::stat`]
    pub async fn get_entry(&self, path: &str) -> Result<Stats> {
        self.stat(path).await
    }

    /// Same as [`Self::stat`]
    pub async fn head(&self, path: &str) -> Result<Stats> {
        self.stat(path).await
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let path = path::normalize(path)?;
        Ok(self.entries.try_get(&path).await?.is_some())
    }

    /// Replace the entry. The root must stay a directory.
    pub async fn put_entry(&self, path: &str, stats: &Stats) -> Result<()> {
        let path = path::normalize(path)?;
        if path::is_root(&path) && stats.is_file() {
            return Err(Error::type_mismatch(&path, "the root is a directory"));
        }
        self.entries.put(&path, stats).await
    }

    /// Merge `patch` into the entry. The root must stay a directory.
    pub async fn patch_entry(&self, path: &str, patch: &StatsPatch) -> Result<Stats> {
        let path = path::normalize(path)?;
        if path::is_root(&path) && patch.size.is_some() {
            return Err(Error::type_mismatch(&path, "the root is a directory"));
        }
        self.entries.patch(&path, patch).await
    }

    pub async fn remove_entry(&self, path: &str, lenient: bool) -> Result<()> {
        let path = path::normalize(path)?;
        self.entries.remove(&path, lenient).await
    }

    // Directories

    /// Full paths of the direct children of `dir`
    pub async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let dir = path::normalize(dir)?;
        self.scanner.list(&dir).await
    }

    /// Create a directory; with `recursive`, also its missing ancestors,
    /// and an existing directory is not an error.
    pub async fn mkdir(&self, dir: &str, recursive: bool) -> Result<Stats> {
        let dir = path::normalize(dir)?;
        if let Some(stats) = self.entries.try_get(&dir).await? {
            if stats.is_directory() && recursive {
                return Ok(stats);
            }
            return Err(Error::already_exists(&dir));
        }

        let mut missing = vec![dir.clone()];
        let mut next = path::parent(&dir);
        while let Some(ancestor) = next {
            match self.entries.try_get(ancestor).await? {
                Some(stats) if stats.is_directory() => break,
                Some(_) => return Err(Error::type_mismatch(ancestor, "not a directory")),
                None if recursive => {
                    missing.push(ancestor.to_string());
                    next = path::parent(ancestor);
                }
                None => return Err(Error::not_found(ancestor)),
            }
        }

        let stats = Stats::directory(now_millis());
        for created in missing.iter().rev() {
            self.entries.put(created, &stats).await?;
            debug!("Created directory {created}", created: created);
        }
        Ok(stats)
    }

    /// Remove a directory; with `recursive`, everything below it too.
    ///
    /// The root itself is never removed, only emptied.
    pub async fn rmdir(&self, dir: &str, recursive: bool) -> Result<()> {
        let dir = path::normalize(dir)?;
        let stats = self.entries.get(&dir).await?;
        if stats.is_file() {
            return Err(Error::type_mismatch(&dir, "not a directory"));
        }

        if recursive {
            for key in self.scanner.descendants(&dir).await? {
                match self.entries.try_get(&key).await? {
                    Some(child) if child.is_file() => self.engine.remove(&key).await?,
                    Some(_) => self.entries.remove(&key, true).await?,
                    None => {}
                }
            }
        } else if !self.scanner.list(&dir).await?.is_empty() {
            return Err(Error::operation(&dir, "directory not empty"));
        }

        if !path::is_root(&dir) {
            self.entries.remove(&dir, false).await?;
        }
        Ok(())
    }

    // Contents

    pub async fn load(&self, path: &str) -> Result<Payload> {
        let path = path::normalize(path)?;
        self.engine.load(&path).await
    }

    /// Contents of a file in the requested shape
    pub async fn read(&self, path: &str, to: SourceType) -> Result<Source> {
        let path = path::normalize(path)?;
        let payload = self.engine.load(&path).await?;
        convert::convert(Source::from(payload), to).map_err(|e| Error::conversion(&path, e))
    }

    pub async fn read_text(&self, path: &str) -> Result<String> {
        let path = path::normalize(path)?;
        let payload = self.engine.load(&path).await?;
        convert::to_text(Source::from(payload)).map_err(|e| Error::conversion(&path, e))
    }

    pub async fn save<S: Into<Source>>(
        &self,
        path: &str,
        source: S,
        options: SaveOptions,
    ) -> Result<SaveOutcome> {
        let path = path::normalize(path)?;
        self.engine.save(&path, source.into(), options).await
    }

    /// Replace the contents, creating the file if needed.
    pub async fn write_all<S: Into<Source>>(&self, path: &str, source: S) -> Result<SaveOutcome> {
        self.save(path, source, SaveOptions::default()).await
    }

    pub async fn append<S: Into<Source>>(&self, path: &str, source: S) -> Result<SaveOutcome> {
        self.save(path, source, SaveOptions::append()).await
    }

    pub async fn write_at<S: Into<Source>>(
        &self,
        path: &str,
        offset: u64,
        source: S,
    ) -> Result<SaveOutcome> {
        let path = path::normalize(path)?;
        self.engine.write_at(&path, offset, source.into(), true).await
    }

    pub async fn truncate(&self, path: &str, size: u64) -> Result<Stats> {
        let path = path::normalize(path)?;
        self.engine.truncate(&path, size).await
    }

    /// Remove a file
    pub async fn remove(&self, path: &str) -> Result<()> {
        let path = path::normalize(path)?;
        self.engine.remove(&path).await
    }

    /// Move a file or a whole directory tree, in one transaction.
    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = path::normalize(from)?;
        let to = path::normalize(to)?;
        if from == to {
            return self.entries.get(&from).await.map(|_| ());
        }
        if path::is_root(&from) || path::is_root(&to) || path::is_within(&from, &to) {
            return Err(Error::invalid_path(&to));
        }

        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE, CONTENT_TABLE], TxMode::ReadWrite)
            .await
            .map_err(|e| Error::write(&from, e))?;

        let source = entry::get_in(tx.as_mut(), &from)
            .await?
            .ok_or_else(|| Error::not_found(&from))?;
        if entry::get_in(tx.as_mut(), &to).await?.is_some() {
            return Err(Error::already_exists(&to));
        }
        let parent = path::parent(&to).ok_or_else(|| Error::invalid_path(&to))?;
        match entry::get_in(tx.as_mut(), parent).await? {
            Some(stats) if stats.is_directory() => {}
            Some(_) => return Err(Error::type_mismatch(parent, "not a directory")),
            None => return Err(Error::not_found(parent)),
        }

        let mut keys = vec![from.clone()];
        if source.is_directory() {
            let mut cursor =
                Cursor::open(tx.as_mut(), ENTRY_TABLE, path::descendant_range(&from));
            while let Some(key) = cursor.next_key().await.map_err(|e| Error::read(&from, e))? {
                keys.push(key);
            }
        }

        for key in &keys {
            let target = path::rebase(key, &from, &to);
            for table in [ENTRY_TABLE, CONTENT_TABLE] {
                let value = tx.get(table, key).await.map_err(|e| Error::read(key, e))?;
                if let Some(value) = value {
                    tx.put(table, &target, value)
                        .await
                        .map_err(|e| Error::write(&target, e))?;
                    tx.delete(table, key)
                        .await
                        .map_err(|e| Error::write(key, e))?;
                }
            }
        }
        tx.commit().await.map_err(|e| Error::write(&from, e))?;

        let moved = keys.len();
        debug!(
            "Renamed {from} to {to} ({moved} entries)",
            from: from,
            to: to,
            moved: moved
        );
        Ok(())
    }

    /// Object URL for a file's contents. Only `GET` URLs exist.
    pub async fn to_url(&self, path: &str, method: UrlMethod) -> Result<ObjectUrl> {
        let path = path::normalize(path)?;
        if method != UrlMethod::Get {
            return Err(Error::not_supported(
                &path,
                format!("{method:?} URLs are not supported"),
            ));
        }
        if self.entries.get(&path).await?.is_directory() {
            return Err(Error::type_mismatch(&path, "is a directory"));
        }
        let payload = self.engine.load(&path).await?;
        let object = convert::to_object(Source::from(payload))
            .map_err(|e| Error::conversion(&path, e))?;
        Ok(ObjectUrl {
            url: format!("blob:kvfs/{}/{}", self.repository, uuid7::uuid7()),
            object,
        })
    }

    // Streams

    pub async fn create_read_stream(&self, path: &str) -> Result<ReadStream> {
        let path = path::normalize(path)?;
        if self.entries.get(&path).await?.is_directory() {
            return Err(Error::type_mismatch(&path, "is a directory"));
        }
        Ok(ReadStream::new(
            self.engine.clone(),
            path,
            self.options.read_chunk_size,
        ))
    }

    pub async fn create_write_stream(
        &self,
        path: &str,
        options: WriteOptions,
    ) -> Result<WriteStream> {
        let path = path::normalize(path)?;
        match self.entries.try_get(&path).await? {
            Some(stats) if stats.is_directory() => {
                return Err(Error::type_mismatch(&path, "is a directory"));
            }
            None if !options.create => return Err(Error::not_found(&path)),
            _ => {}
        }
        Ok(WriteStream::new(self.engine.clone(), path, options))
    }
}
