use crate::error::Result;
use crate::range::KeyRange;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Connection-level event delivered outside of any single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbEvent {
    Healthy,
    Error(String),
    Abort(String),
    Closed,
}

/// Schema editor handed to an [`Upgrade`] while a database is being opened.
pub trait Schema {
    fn contains(&self, table: &str) -> bool;
    fn create_table(&mut self, table: &str) -> Result<()>;
}

/// One-time schema migration, run when the stored version is older than
/// the version requested at open.
pub trait Upgrade: Send + Sync {
    fn upgrade(&self, schema: &mut dyn Schema, old_version: u32) -> Result<()>;
}

/// Entry point of a storage backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open (creating if needed) the named database at `version`.
    ///
    /// Waits for as long as another holder blocks opens; callers impose
    /// their own timeout.
    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: &dyn Upgrade,
    ) -> Result<Arc<dyn Database>>;
}

/// An open connection to one database
#[async_trait]
pub trait Database: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> u32;
    fn table_names(&self) -> Vec<String>;

    /// Begin a transaction scoped to `tables`.
    async fn begin(&self, tables: &[&str], mode: TxMode) -> Result<Box<dyn Transaction>>;

    /// Subscribe to out-of-band events for this connection.
    fn events(&self) -> watch::Receiver<DbEvent>;

    fn close(&self);
}

/// A unit of atomic work over a fixed set of tables
#[async_trait]
pub trait Transaction: Send {
    fn mode(&self) -> TxMode;

    async fn get(&mut self, table: &str, key: &str) -> Result<Option<Value>>;
    async fn put(&mut self, table: &str, key: &str, value: Value) -> Result<()>;
    async fn delete(&mut self, table: &str, key: &str) -> Result<()>;

    /// First record in `range` whose key sorts strictly after `after`.
    async fn next_in_range(
        &mut self,
        table: &str,
        range: &KeyRange,
        after: Option<&str>,
    ) -> Result<Option<(String, Value)>>;

    /// Make every write of this transaction visible at once.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every write of this transaction.
    async fn abort(self: Box<Self>);
}
