//! Lazily opened, self-healing connection to the backing store.
//!
//! The first operation opens the database, creates the tables, probes
//! which payload encoding the store accepts, and makes sure the root
//! directory exists. Later operations reuse that connection until the
//! store reports an error, an abort or a close on it; the next operation
//! after that opens (and probes) afresh.

use crate::encoding::PayloadEncoding;
use crate::entry;
use crate::error::{Error, Result};
use crate::path::ROOT;
use crate::probe;
use crate::stats::{Stats, now_millis};
use diagnostics::*;
use kvstore::{Backend, Database, DbEvent, Schema, Transaction, TxMode, Upgrade};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

/// path -> serialized [`Stats`]
pub const ENTRY_TABLE: &str = "kvfs-entries";
/// path -> payload
pub const CONTENT_TABLE: &str = "kvfs-contents";
/// Scratch records written by the capability probe
pub const SCRATCH_TABLE: &str = "kvfs-scratch";

pub const SCHEMA_VERSION: u32 = 1;

struct SchemaMigration;

impl Upgrade for SchemaMigration {
    fn upgrade(&self, schema: &mut dyn Schema, old_version: u32) -> kvstore::Result<()> {
        for table in [SCRATCH_TABLE, ENTRY_TABLE, CONTENT_TABLE] {
            if !schema.contains(table) {
                schema.create_table(table)?;
                debug!(
                    "Created table {table} (schema version {old_version})",
                    table: table,
                    old_version: old_version
                );
            }
        }
        Ok(())
    }
}

/// An open database together with what was negotiated when it was opened
pub struct Connection {
    db: Arc<dyn Database>,
    encoding: PayloadEncoding,
    events: watch::Receiver<DbEvent>,
}

impl Connection {
    #[must_use]
    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        *self.events.borrow() == DbEvent::Healthy
    }

    pub(crate) async fn begin(
        &self,
        tables: &[&str],
        mode: TxMode,
    ) -> kvstore::Result<Box<dyn Transaction>> {
        self.db.begin(tables, mode).await
    }
}

pub struct ConnectionManager {
    backend: Arc<dyn Backend>,
    repository: String,
    open_timeout: Duration,
    current: Mutex<Option<Arc<Connection>>>,
}

impl ConnectionManager {
    pub fn new(backend: Arc<dyn Backend>, repository: &str, open_timeout: Duration) -> Self {
        Self {
            backend,
            repository: repository.to_string(),
            open_timeout,
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Return the live connection, opening one if there is none.
    pub async fn connect(&self) -> Result<Arc<Connection>> {
        let mut current = self.current.lock().await;
        if let Some(conn) = current.as_ref() {
            if conn.is_healthy() {
                return Ok(Arc::clone(conn));
            }
            let event = format!("{:?}", *conn.events.borrow());
            let repository = &self.repository;
            warn!(
                "Connection to {repository} invalidated by {event}, reopening",
                repository: repository,
                event: event
            );
            conn.db.close();
            *current = None;
        }

        let conn = Arc::new(self.establish().await?);
        *current = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Close the current connection, if any. The next operation reopens.
    pub async fn dispose(&self) {
        if let Some(conn) = self.current.lock().await.take() {
            let repository = &self.repository;
            debug!("Closing connection to {repository}", repository: repository);
            conn.db.close();
        }
    }

    /// Whether a connection is currently held
    pub async fn is_open(&self) -> bool {
        self.current.lock().await.is_some()
    }

    async fn establish(&self) -> Result<Connection> {
        let repository = &self.repository;
        let migration = SchemaMigration;
        let opening = self.backend.open(repository, SCHEMA_VERSION, &migration);

        let db = match tokio::time::timeout(self.open_timeout, opening).await {
            Ok(Ok(db)) => db,
            Ok(Err(e)) => {
                let error = e.to_string();
                error!(
                    "Failed to open {repository}: {error}",
                    repository: repository,
                    error: error
                );
                return Err(Error::operation(ROOT, format!("open failed: {error}")));
            }
            Err(_) => {
                let waited_ms = u64::try_from(self.open_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    "Opening {repository} blocked for {waited_ms} ms",
                    repository: repository,
                    waited_ms: waited_ms
                );
                return Err(Error::Blocked {
                    repository: repository.clone(),
                    waited_ms,
                });
            }
        };

        let events = db.events();
        let encoding = probe::negotiate(db.as_ref()).await;

        if let Err(e) = ensure_root(db.as_ref()).await {
            db.close();
            return Err(e);
        }

        let encoding_name = encoding.as_str();
        info!(
            "Opened {repository} storing contents as {encoding_name}",
            repository: repository,
            encoding_name: encoding_name
        );
        Ok(Connection {
            db,
            encoding,
            events,
        })
    }
}

async fn ensure_root(db: &dyn Database) -> Result<()> {
    let mut tx = db
        .begin(&[ENTRY_TABLE], TxMode::ReadWrite)
        .await
        .map_err(|e| Error::write(ROOT, e))?;

    let existing = tx
        .get(ENTRY_TABLE, ROOT)
        .await
        .map_err(|e| Error::read(ROOT, e))?;
    let live = match existing {
        Some(value) => !entry::decode(ROOT, value)?.is_deleted(),
        None => false,
    };
    if live {
        return Ok(());
    }

    let record = entry::encode(ROOT, &Stats::directory(now_millis()))?;
    tx.put(ENTRY_TABLE, ROOT, record)
        .await
        .map_err(|e| Error::write(ROOT, e))?;
    tx.commit().await.map_err(|e| Error::write(ROOT, e))?;
    debug!("Created root directory entry");
    Ok(())
}
