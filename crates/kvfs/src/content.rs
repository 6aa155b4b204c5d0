//! The content table: one payload per file path.

use crate::connection::{CONTENT_TABLE, ConnectionManager};
use crate::encoding::Payload;
use crate::error::{Error, Result};
use kvstore::{Transaction, TxMode};
use std::sync::Arc;

pub(crate) async fn get_in(tx: &mut dyn Transaction, path: &str) -> Result<Option<Payload>> {
    let value = tx
        .get(CONTENT_TABLE, path)
        .await
        .map_err(|e| Error::read(path, e))?;
    match value {
        Some(value) => {
            let kind = value.kind();
            Payload::from_value(value)
                .map(Some)
                .ok_or_else(|| Error::operation(path, format!("content record holds a {kind}")))
        }
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct ContentTable {
    connections: Arc<ConnectionManager>,
}

impl ContentTable {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    pub async fn try_get(&self, path: &str) -> Result<Option<Payload>> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[CONTENT_TABLE], TxMode::ReadOnly)
            .await
            .map_err(|e| Error::read(path, e))?;
        let payload = get_in(tx.as_mut(), path).await?;
        tx.commit().await.map_err(|e| Error::read(path, e))?;
        Ok(payload)
    }

    pub async fn get(&self, path: &str) -> Result<Payload> {
        self.try_get(path)
            .await?
            .ok_or_else(|| Error::not_found(path))
    }

    /// Store `bytes` in the connection's negotiated encoding.
    pub async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<Payload> {
        let conn = self.connections.connect().await?;
        let payload = Payload::encode(bytes, conn.encoding());
        let mut tx = conn
            .begin(&[CONTENT_TABLE], TxMode::ReadWrite)
            .await
            .map_err(|e| Error::write(path, e))?;
        tx.put(CONTENT_TABLE, path, payload.clone().into_value())
            .await
            .map_err(|e| Error::write(path, e))?;
        tx.commit().await.map_err(|e| Error::write(path, e))?;
        Ok(payload)
    }

    /// Delete the payload at `path`. Deleting a missing payload succeeds.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let conn = self.connections.connect().await?;
        let mut tx = conn
            .begin(&[CONTENT_TABLE], TxMode::ReadWrite)
            .await
            .map_err(|e| Error::write(path, e))?;
        tx.delete(CONTENT_TABLE, path)
            .await
            .map_err(|e| Error::write(path, e))?;
        tx.commit().await.map_err(|e| Error::write(path, e))
    }
}
