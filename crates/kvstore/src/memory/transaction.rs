use super::{MemoryStore, Shared, Table, lock};
use crate::backend::{Transaction, TxMode};
use crate::error::{Result, StoreError};
use crate::range::KeyRange;
use crate::value::Value;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OwnedMutexGuard;

/// Staged writes for one table; `None` marks a delete.
type Pending = BTreeMap<String, Option<Value>>;

pub(crate) struct MemoryTransaction {
    db_name: String,
    mode: TxMode,
    snapshot: HashMap<String, Table>,
    pending: HashMap<String, Pending>,
    store: Arc<MemoryStore>,
    shared: Arc<Shared>,
    closed: Arc<AtomicBool>,
    _writer: Option<OwnedMutexGuard<()>>,
}

impl MemoryTransaction {
    pub(crate) fn new(
        db_name: String,
        mode: TxMode,
        snapshot: HashMap<String, Table>,
        store: Arc<MemoryStore>,
        shared: Arc<Shared>,
        closed: Arc<AtomicBool>,
        writer: Option<OwnedMutexGuard<()>>,
    ) -> Self {
        Self {
            db_name,
            mode,
            snapshot,
            pending: HashMap::new(),
            store,
            shared,
            closed,
            _writer: writer,
        }
    }

    fn table(&self, table: &str) -> Result<&Table> {
        self.snapshot
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn check_writable(&self, table: &str) -> Result<()> {
        _ = self.table(table)?;
        if self.mode == TxMode::ReadOnly {
            return Err(StoreError::ReadOnly(table.to_string()));
        }
        if self.shared.write_denied(table) {
            return Err(StoreError::WriteDenied(table.to_string()));
        }
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed(self.db_name.clone()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    fn mode(&self) -> TxMode {
        self.mode
    }

    async fn get(&mut self, table: &str, key: &str) -> Result<Option<Value>> {
        self.check_open()?;
        let data = self.table(table)?;
        if let Some(staged) = self.pending.get(table).and_then(|p| p.get(key)) {
            return Ok(staged.clone());
        }
        Ok(data.get(key).cloned())
    }

    async fn put(&mut self, table: &str, key: &str, value: Value) -> Result<()> {
        self.check_open()?;
        self.check_writable(table)?;
        if !self.shared.accepts(&value) {
            return Err(StoreError::DataClone {
                table: table.to_string(),
                kind: value.kind(),
            });
        }
        _ = self
            .pending
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), Some(value));
        Ok(())
    }

    async fn delete(&mut self, table: &str, key: &str) -> Result<()> {
        self.check_open()?;
        self.check_writable(table)?;
        _ = self
            .pending
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), None);
        Ok(())
    }

    async fn next_in_range(
        &mut self,
        table: &str,
        range: &KeyRange,
        after: Option<&str>,
    ) -> Result<Option<(String, Value)>> {
        self.check_open()?;
        let data = self.table(table)?;
        let Some(bounds) = range.remaining(after) else {
            return Ok(None);
        };

        // Walk committed and staged keys together; a staged entry shadows
        // the committed one with the same key, and `None` is a delete.
        let mut committed = data.range(bounds.clone()).peekable();
        let mut staged = self
            .pending
            .get(table)
            .map(|pending| pending.range(bounds))
            .into_iter()
            .flatten()
            .peekable();

        loop {
            let take_staged = match (committed.peek(), staged.peek()) {
                (None, None) => return Ok(None),
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (Some((committed_key, _)), Some((staged_key, _))) => staged_key <= committed_key,
            };
            if take_staged {
                if let Some((key, value)) = staged.next() {
                    if committed.peek().is_some_and(|(k, _)| *k == key) {
                        _ = committed.next();
                    }
                    if let Some(value) = value {
                        return Ok(Some((key.clone(), value.clone())));
                    }
                }
            } else if let Some((key, value)) = committed.next() {
                return Ok(Some((key.clone(), value.clone())));
            }
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.check_open()?;
        if self.mode == TxMode::ReadOnly || self.pending.is_empty() {
            return Ok(());
        }
        if let Some(table) = self
            .pending
            .keys()
            .find(|table| self.shared.commit_aborted(table))
        {
            return Err(StoreError::Aborted(format!(
                "commit to {table} was rejected by the store"
            )));
        }

        let mut state = lock(&self.store.state);
        for (table, writes) in &self.pending {
            let mut puts = 0;
            {
                let data = state
                    .tables
                    .entry(table.clone())
                    .or_insert_with(|| Arc::new(BTreeMap::new()));
                let data = Arc::make_mut(data);
                for (key, value) in writes {
                    match value {
                        Some(value) => {
                            _ = data.insert(key.clone(), value.clone());
                            puts += 1;
                        }
                        None => {
                            _ = data.remove(key);
                        }
                    }
                }
            }
            *state.put_counts.entry(table.clone()).or_insert(0) += puts;
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) {}
}
