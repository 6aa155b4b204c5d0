//! In-memory substrate.
//!
//! Used by the test suites and for lightweight, non-persistent use. Tables
//! are copy-on-write `BTreeMap`s, so a read-only transaction gets its
//! snapshot by cloning a handful of `Arc`s, and a read-write transaction
//! publishes its staged writes in one step at commit.
//!
//! Beyond plain storage it lets a test shape the store:
//! - [`Capabilities`] decide which binary value representations are accepted
//! - [`MemoryBackend::deny_writes`] makes every put/delete on a table fail
//! - [`MemoryBackend::abort_commits`] makes commits touching a table abort
//! - [`MemoryBackend::block_opens`] holds every open until the guard drops
//! - [`MemoryBackend::emit_event`] delivers an out-of-band connection event

mod transaction;

use crate::backend::{Backend, Database, DbEvent, Schema, TxMode, Upgrade};
use crate::error::{Result, StoreError};
use crate::value::Value;
use async_trait::async_trait;
use diagnostics::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, watch};

pub(crate) use transaction::MemoryTransaction;

pub(crate) type Table = Arc<BTreeMap<String, Value>>;

/// Which binary representations the store can hold.
///
/// Records and strings are always accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub opaque_objects: bool,
    pub raw_buffers: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            opaque_objects: true,
            raw_buffers: true,
        }
    }
}

impl Capabilities {
    /// A store that only holds records and strings.
    #[must_use]
    pub fn strings_only() -> Self {
        Self {
            opaque_objects: false,
            raw_buffers: false,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Object(_) => self.opaque_objects,
            Value::Buffer(_) => self.raw_buffers,
            Value::Record(_) | Value::Text(_) => true,
        }
    }
}

#[derive(Default)]
pub(crate) struct StoreState {
    pub(crate) version: u32,
    pub(crate) tables: BTreeMap<String, Table>,
    pub(crate) put_counts: HashMap<String, u64>,
}

/// Persistent state of one named database, shared by all its connections
pub(crate) struct MemoryStore {
    pub(crate) state: Mutex<StoreState>,
    pub(crate) writer: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Default)]
pub(crate) struct Faults {
    pub(crate) denied_writes: HashSet<String>,
    pub(crate) aborted_commits: HashSet<String>,
}

pub(crate) struct Shared {
    pub(crate) capabilities: Capabilities,
    pub(crate) faults: Mutex<Faults>,
    stores: Mutex<HashMap<String, Arc<MemoryStore>>>,
    gate: Arc<RwLock<()>>,
    connections: Mutex<Vec<Weak<watch::Sender<DbEvent>>>>,
}

impl Shared {
    pub(crate) fn write_denied(&self, table: &str) -> bool {
        lock(&self.faults).denied_writes.contains(table)
    }

    pub(crate) fn commit_aborted(&self, table: &str) -> bool {
        lock(&self.faults).aborted_commits.contains(table)
    }

    pub(crate) fn accepts(&self, value: &Value) -> bool {
        self.capabilities.accepts(value)
    }
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps every [`Backend::open`] waiting until dropped.
pub struct OpenBlocker {
    _guard: OwnedRwLockWriteGuard<()>,
}

/// In-memory implementation of [`Backend`]
#[derive(Clone)]
pub struct MemoryBackend {
    shared: Arc<Shared>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_capabilities(Capabilities::default())
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            shared: Arc::new(Shared {
                capabilities,
                faults: Mutex::new(Faults::default()),
                stores: Mutex::new(HashMap::new()),
                gate: Arc::new(RwLock::new(())),
                connections: Mutex::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.shared.capabilities
    }

    /// Make every put and delete on `table` fail until [`Self::allow_writes`].
    pub fn deny_writes(&self, table: &str) {
        _ = lock(&self.shared.faults)
            .denied_writes
            .insert(table.to_string());
    }

    pub fn allow_writes(&self, table: &str) {
        _ = lock(&self.shared.faults).denied_writes.remove(table);
    }

    /// Make every commit that wrote to `table` abort until [`Self::resume_commits`].
    pub fn abort_commits(&self, table: &str) {
        _ = lock(&self.shared.faults)
            .aborted_commits
            .insert(table.to_string());
    }

    pub fn resume_commits(&self, table: &str) {
        _ = lock(&self.shared.faults).aborted_commits.remove(table);
    }

    /// Hold every open until the returned guard is dropped.
    pub async fn block_opens(&self) -> OpenBlocker {
        OpenBlocker {
            _guard: self.shared.gate.clone().write_owned().await,
        }
    }

    /// Deliver `event` to every live connection.
    pub fn emit_event(&self, event: DbEvent) {
        let mut connections = lock(&self.shared.connections);
        connections.retain(|weak| match weak.upgrade() {
            Some(sender) => {
                _ = sender.send_replace(event.clone());
                true
            }
            None => false,
        });
    }

    /// Number of committed puts into `table` of database `name`.
    #[must_use]
    pub fn put_count(&self, name: &str, table: &str) -> u64 {
        self.store(name)
            .map(|store| lock(&store.state).put_counts.get(table).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Every committed record of `table`, in key order.
    #[must_use]
    pub fn raw_entries(&self, name: &str, table: &str) -> Vec<(String, Value)> {
        self.store(name)
            .and_then(|store| {
                lock(&store.state)
                    .tables
                    .get(table)
                    .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            })
            .unwrap_or_default()
    }

    fn store(&self, name: &str) -> Option<Arc<MemoryStore>> {
        lock(&self.shared.stores).get(name).cloned()
    }

    fn store_or_create(&self, name: &str) -> Arc<MemoryStore> {
        lock(&self.shared.stores)
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryStore {
                    state: Mutex::new(StoreState::default()),
                    writer: Arc::new(tokio::sync::Mutex::new(())),
                })
            })
            .clone()
    }
}

struct MemorySchema<'a> {
    tables: &'a mut BTreeMap<String, Table>,
}

impl Schema for MemorySchema<'_> {
    fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    fn create_table(&mut self, table: &str) -> Result<()> {
        if self.tables.contains_key(table) {
            return Err(StoreError::TableExists(table.to_string()));
        }
        _ = self.tables.insert(table.to_string(), Arc::new(BTreeMap::new()));
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: &dyn Upgrade,
    ) -> Result<Arc<dyn Database>> {
        let _gate = self.shared.gate.read().await;
        let store = self.store_or_create(name);

        {
            let mut state = lock(&store.state);
            if state.version > version {
                return Err(StoreError::Version {
                    name: name.to_string(),
                    current: state.version,
                    requested: version,
                });
            }
            if state.version < version {
                let old_version = state.version;
                // Stage on a copy so a failed upgrade leaves the schema untouched.
                let mut tables = state.tables.clone();
                upgrade.upgrade(&mut MemorySchema { tables: &mut tables }, old_version)?;
                state.tables = tables;
                state.version = version;
                debug!(
                    "Upgraded {name} from version {old_version} to {version}",
                    name: name,
                    old_version: old_version,
                    version: version
                );
            }
        }

        let (sender, _) = watch::channel(DbEvent::Healthy);
        let sender = Arc::new(sender);
        lock(&self.shared.connections).push(Arc::downgrade(&sender));

        Ok(Arc::new(MemoryDatabase {
            name: name.to_string(),
            version,
            store,
            shared: self.shared.clone(),
            events: sender,
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

/// One open connection to a [`MemoryStore`]
pub struct MemoryDatabase {
    name: String,
    version: u32,
    store: Arc<MemoryStore>,
    shared: Arc<Shared>,
    events: Arc<watch::Sender<DbEvent>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn table_names(&self) -> Vec<String> {
        lock(&self.store.state).tables.keys().cloned().collect()
    }

    async fn begin(&self, tables: &[&str], mode: TxMode) -> Result<Box<dyn crate::Transaction>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed(self.name.clone()));
        }

        // Read-write transactions are serialized for their whole lifetime.
        let writer = match mode {
            TxMode::ReadWrite => Some(self.store.writer.clone().lock_owned().await),
            TxMode::ReadOnly => None,
        };

        let snapshot = {
            let state = lock(&self.store.state);
            let mut snapshot = HashMap::new();
            for table in tables {
                let data = state
                    .tables
                    .get(*table)
                    .ok_or_else(|| StoreError::UnknownTable((*table).to_string()))?;
                _ = snapshot.insert((*table).to_string(), data.clone());
            }
            snapshot
        };

        Ok(Box::new(MemoryTransaction::new(
            self.name.clone(),
            mode,
            snapshot,
            self.store.clone(),
            self.shared.clone(),
            self.closed.clone(),
            writer,
        )))
    }

    fn events(&self) -> watch::Receiver<DbEvent> {
        self.events.subscribe()
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            _ = self.events.send_replace(DbEvent::Closed);
        }
    }
}
