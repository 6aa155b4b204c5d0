use crate::connection::{ConnectionManager, ENTRY_TABLE};
use crate::entry;
use crate::error::{Error, Result};
use crate::path;
use diagnostics::*;
use kvstore::{Cursor, TxMode};
use std::sync::Arc;

/// Lists directories by range-scanning the entry table.
#[derive(Clone)]
pub struct DirectoryScanner {
    connections: Arc<ConnectionManager>,
}

impl DirectoryScanner {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Full paths of the live direct children of `dir`, in key order.
    pub async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE], TxMode::ReadOnly)
            .await
            .map_err(|e| Error::read(dir, e))?;

        match entry::get_in(tx.as_mut(), dir).await? {
            None => return Err(Error::not_found(dir)),
            Some(stats) if stats.is_file() => {
                return Err(Error::type_mismatch(dir, "not a directory"));
            }
            Some(_) => {}
        }

        let mut children = Vec::new();
        {
            let mut cursor = Cursor::open(tx.as_mut(), ENTRY_TABLE, path::descendant_range(dir));
            while let Some((key, value)) = cursor.next().await.map_err(|e| Error::read(dir, e))? {
                if !path::is_direct_child(dir, &key) {
                    continue;
                }
                if entry::decode(&key, value)?.is_deleted() {
                    continue;
                }
                children.push(key);
            }
        }
        tx.commit().await.map_err(|e| Error::read(dir, e))?;

        let count = children.len();
        debug!("Listed {dir}: {count} entries", dir: dir, count: count);
        Ok(children)
    }

    /// Every key below `dir` (live or not), deepest first.
    pub(crate) async fn descendants(&self, dir: &str) -> Result<Vec<String>> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[ENTRY_TABLE], TxMode::ReadOnly)
            .await
            .map_err(|e| Error::read(dir, e))?;
        let mut keys = Vec::new();
        {
            let mut cursor = Cursor::open(tx.as_mut(), ENTRY_TABLE, path::descendant_range(dir));
            while let Some(key) = cursor.next_key().await.map_err(|e| Error::read(dir, e))? {
                if key != dir {
                    keys.push(key);
                }
            }
        }
        tx.commit().await.map_err(|e| Error::read(dir, e))?;
        keys.sort_by_key(|key| std::cmp::Reverse(path::slash_count(key)));
        Ok(keys)
    }
}
