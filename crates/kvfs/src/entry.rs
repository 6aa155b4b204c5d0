//! The entry table: one metadata record per path.

use crate::config::DeleteMode;
use crate::connection::{ConnectionManager, ENTRY_TABLE};
use crate::error::{Error, Result};
use crate::stats::{Stats, StatsPatch, now_millis};
use async_trait::async_trait;
use diagnostics::*;
use kvstore::{Transaction, TxMode, Value};
use std::sync::Arc;

pub(crate) fn decode(path: &str, value: Value) -> Result<Stats> {
    match value {
        Value::Record(record) => serde_json::from_value(record)
            .map_err(|e| Error::operation(path, format!("corrupt entry record: {e}"))),
        other => Err(Error::operation(
            path,
            format!("entry record holds a {}", other.kind()),
        )),
    }
}

pub(crate) fn encode(path: &str, stats: &Stats) -> Result<Value> {
    serde_json::to_value(stats)
        .map(Value::Record)
        .map_err(|e| Error::operation(path, format!("cannot serialize entry: {e}")))
}

/// Live entry at `path` inside an open transaction. Tombstones read as absent.
pub(crate) async fn get_in(tx: &mut dyn Transaction, path: &str) -> Result<Option<Stats>> {
    let value = tx
        .get(ENTRY_TABLE, path)
        .await
        .map_err(|e| Error::read(path, e))?;
    match value {
        Some(value) => {
            let stats = decode(path, value)?;
            Ok((!stats.is_deleted()).then_some(stats))
        }
        None => Ok(None),
    }
}

pub(crate) async fn put_in(tx: &mut dyn Transaction, path: &str, stats: &Stats) -> Result<()> {
    tx.put(ENTRY_TABLE, path, encode(path, stats)?)
        .await
        .map_err(|e| Error::write(path, e))
}

/// How an entry disappears
#[async_trait]
pub trait RemoveStrategy: Send + Sync {
    fn mode(&self) -> DeleteMode;

    /// Remove the live entry at `path` within `tx`.
    ///
    /// A missing entry is `NotFound` unless `lenient`.
    async fn remove(&self, tx: &mut dyn Transaction, path: &str, lenient: bool) -> Result<()>;
}

pub struct HardDelete;

#[async_trait]
impl RemoveStrategy for HardDelete {
    fn mode(&self) -> DeleteMode {
        DeleteMode::Hard
    }

    async fn remove(&self, tx: &mut dyn Transaction, path: &str, lenient: bool) -> Result<()> {
        if get_in(tx, path).await?.is_none() && !lenient {
            return Err(Error::not_found(path));
        }
        // Also clears a tombstone left by an earlier soft delete.
        tx.delete(ENTRY_TABLE, path)
            .await
            .map_err(|e| Error::write(path, e))
    }
}

pub struct SoftDelete;

#[async_trait]
impl RemoveStrategy for SoftDelete {
    fn mode(&self) -> DeleteMode {
        DeleteMode::Soft
    }

    async fn remove(&self, tx: &mut dyn Transaction, path: &str, lenient: bool) -> Result<()> {
        match get_in(tx, path).await? {
            Some(mut stats) => {
                stats.apply(&StatsPatch::deleted(now_millis()));
                put_in(tx, path, &stats).await
            }
            None if lenient => Ok(()),
            None => Err(Error::not_found(path)),
        }
    }
}

#[must_use]
pub fn strategy_for(mode: DeleteMode) -> Arc<dyn RemoveStrategy> {
    match mode {
        DeleteMode::Hard => Arc::new(HardDelete),
        DeleteMode::Soft => Arc::new(SoftDelete),
    }
}

/// Stats records keyed by path
#[derive(Clone)]
pub struct EntryTable {
    connections: Arc<ConnectionManager>,
    removal: Arc<dyn RemoveStrategy>,
}

impl EntryTable {
    pub fn new(connections: Arc<ConnectionManager>, removal: Arc<dyn RemoveStrategy>) -> Self {
        Self {
            connections,
            removal,
        }
    }

    #[must_use]
    pub fn delete_mode(&self) -> DeleteMode {
        self.removal.mode()
    }

    /// Live entry at `path`, or `None`.
    pub async fn try_get(&self, path: &str) -> Result<Option<Stats>> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE], TxMode::ReadOnly)
            .await
            .map_err(|e| Error::read(path, e))?;
        let stats = get_in(tx.as_mut(), path).await?;
        tx.commit().await.map_err(|e| Error::read(path, e))?;
        Ok(stats)
    }

    pub async fn get(&self, path: &str) -> Result<Stats> {
        self.try_get(path)
            .await?
            .ok_or_else(|| Error::not_found(path))
    }

    pub async fn put(&self, path: &str, stats: &Stats) -> Result<()> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE], TxMode::ReadWrite)
            .await
            .map_err(|e| Error::write(path, e))?;
        put_in(tx.as_mut(), path, stats).await?;
        tx.commit().await.map_err(|e| Error::write(path, e))
    }

    /// Merge `patch` into the live entry and return the result.
    pub async fn patch(&self, path: &str, patch: &StatsPatch) -> Result<Stats> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE], TxMode::ReadWrite)
            .await
            .map_err(|e| Error::write(path, e))?;
        let mut stats = get_in(tx.as_mut(), path)
            .await?
            .ok_or_else(|| Error::not_found(path))?;
        stats.apply(patch);
        put_in(tx.as_mut(), path, &stats).await?;
        tx.commit().await.map_err(|e| Error::write(path, e))?;
        Ok(stats)
    }

    pub async fn remove(&self, path: &str, lenient: bool) -> Result<()> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE], TxMode::ReadWrite)
            .await
            .map_err(|e| Error::write(path, e))?;
        self.removal.remove(tx.as_mut(), path, lenient).await?;
        tx.commit().await.map_err(|e| Error::write(path, e))?;
        let mode = format!("{:?}", self.removal.mode());
        debug!("Removed entry {path} ({mode} delete)", path: path, mode: mode);
        Ok(())
    }
}
