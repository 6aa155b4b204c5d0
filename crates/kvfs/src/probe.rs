//! Capability probe: which binary representation does the store accept?
//!
//! Each candidate is written to the scratch table and read back, in its
//! own transaction, so a rejected attempt leaves nothing behind.

use crate::connection::SCRATCH_TABLE;
use crate::encoding::PayloadEncoding;
use bytes::Bytes;
use diagnostics::*;
use kvstore::{Database, TxMode, Value};

/// Pick the first encoding the store round-trips, falling back to
/// embedded strings, which every store holds.
pub async fn negotiate(db: &dyn Database) -> PayloadEncoding {
    let candidates = [
        (
            PayloadEncoding::OpaqueObject,
            Value::Object(Bytes::from_static(b"test")),
        ),
        (PayloadEncoding::RawBuffer, Value::Buffer(vec![0; 10])),
    ];

    for (encoding, sample) in candidates {
        let name = encoding.as_str();
        match round_trips(db, name, sample).await {
            Ok(true) => return encoding,
            Ok(false) => debug!("Store altered a {name} sample", name: name),
            Err(e) => {
                let error = e.to_string();
                debug!(
                    "Store rejected a {name} sample: {error}",
                    name: name,
                    error: error
                );
            }
        }
    }
    PayloadEncoding::EmbeddedString
}

async fn round_trips(db: &dyn Database, key: &str, sample: Value) -> kvstore::Result<bool> {
    let mut tx = db.begin(&[SCRATCH_TABLE], TxMode::ReadWrite).await?;
    tx.put(SCRATCH_TABLE, key, sample.clone()).await?;
    tx.commit().await?;

    let mut tx = db.begin(&[SCRATCH_TABLE], TxMode::ReadOnly).await?;
    let stored = tx.get(SCRATCH_TABLE, key).await?;
    tx.commit().await?;
    Ok(stored.as_ref() == Some(&sample))
}
