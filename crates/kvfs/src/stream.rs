//! Sequential access to file contents.
//!
//! Both streams keep only a position. The read stream caches the payload
//! between reads and drops the cache on every seek, so seeking back picks
//! up writes made in between.

use crate::convert::{self, Source, SourceType};
use crate::engine::ContentEngine;
use crate::error::{Error, Result};
use std::io::SeekFrom;

fn seek_target(path: &str, position: u64, len: u64, pos: SeekFrom) -> Result<u64> {
    let (base, delta) = match pos {
        SeekFrom::Start(n) => return Ok(n),
        SeekFrom::Current(d) => (position, d),
        SeekFrom::End(d) => (len, d),
    };
    base.checked_add_signed(delta)
        .ok_or_else(|| Error::operation(path, "seek before the start of the file"))
}

pub struct ReadStream {
    engine: ContentEngine,
    path: String,
    chunk_size: usize,
    position: u64,
    buffer: Option<Vec<u8>>,
}

impl ReadStream {
    pub(crate) fn new(engine: ContentEngine, path: String, chunk_size: usize) -> Self {
        Self {
            engine,
            path,
            chunk_size,
            position: 0,
            buffer: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read up to `size` bytes (the chunk size when `None`), or `None` at
    /// end of file.
    pub async fn read(&mut self, size: Option<usize>) -> Result<Option<Vec<u8>>> {
        let limit = size.unwrap_or(self.chunk_size);
        let position = usize::try_from(self.position).unwrap_or(usize::MAX);
        let buffer = self.buffered().await?;
        if position >= buffer.len() {
            return Ok(None);
        }
        let end = position.saturating_add(limit).min(buffer.len());
        let chunk = buffer[position..end].to_vec();
        self.position = end as u64;
        Ok(Some(chunk))
    }

    /// Like [`Self::read`], converting the chunk to `to`.
    pub async fn read_as(&mut self, size: Option<usize>, to: SourceType) -> Result<Option<Source>> {
        match self.read(size).await? {
            Some(chunk) => convert::convert(Source::Bytes(chunk), to)
                .map(Some)
                .map_err(|e| Error::conversion(&self.path, e)),
            None => Ok(None),
        }
    }

    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.buffer = None;
        let len = match pos {
            SeekFrom::End(_) => self.buffered().await?.len() as u64,
            _ => 0,
        };
        self.position = seek_target(&self.path, self.position, len, pos)?;
        Ok(self.position)
    }

    pub fn close(mut self) {
        self.buffer = None;
    }

    async fn buffered(&mut self) -> Result<&Vec<u8>> {
        if self.buffer.is_none() {
            self.buffer = Some(self.engine.load_bytes(&self.path).await?);
        }
        Ok(self.buffer.get_or_insert_with(Vec::new))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Start at the end of the current contents instead of truncating
    pub append: bool,
    /// Create the file when it does not exist
    pub create: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            append: false,
            create: true,
        }
    }
}

pub struct WriteStream {
    engine: ContentEngine,
    path: String,
    options: WriteOptions,
    position: u64,
    started: bool,
}

impl WriteStream {
    pub(crate) fn new(engine: ContentEngine, path: String, options: WriteOptions) -> Self {
        Self {
            engine,
            path,
            options,
            position: 0,
            started: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write `source` at the current position and advance past it.
    pub async fn write<S: Into<Source>>(&mut self, source: S) -> Result<u64> {
        self.start().await?;
        let outcome = self
            .engine
            .write_at(&self.path, self.position, source.into(), self.options.create)
            .await?;
        self.position += outcome.written;
        Ok(outcome.written)
    }

    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.start().await?;
        let len = match pos {
            SeekFrom::End(_) => self.current_len().await?,
            _ => 0,
        };
        self.position = seek_target(&self.path, self.position, len, pos)?;
        Ok(self.position)
    }

    pub async fn truncate(&mut self, size: u64) -> Result<()> {
        self.start().await?;
        _ = self.engine.truncate(&self.path, size).await?;
        self.position = self.position.min(size);
        Ok(())
    }

    pub fn close(self) {}

    /// On first use, position at the end when appending, otherwise
    /// empty the file.
    async fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        if self.options.append {
            self.position = self.current_len().await?;
        } else {
            match self.engine.truncate(&self.path, 0).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() && self.options.create => {}
                Err(e) => return Err(e),
            }
            self.position = 0;
        }
        self.started = true;
        Ok(())
    }

    async fn current_len(&self) -> Result<u64> {
        match self.engine.load_quiet(&self.path).await {
            Ok(payload) => Ok(payload.len() as u64),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e),
        }
    }
}
