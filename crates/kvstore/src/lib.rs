//! kvstore - a transactional key-value substrate
//!
//! Flat tables of string keys with range cursors and atomic, per-transaction
//! commits. Nothing here knows about files or directories; that mapping
//! lives in the `kvfs` crate.

pub mod backend;
pub mod cursor;
pub mod error;
pub mod memory;
pub mod range;
pub mod value;

pub use backend::{Backend, Database, DbEvent, Schema, Transaction, TxMode, Upgrade};
pub use cursor::Cursor;
pub use error::{Result, StoreError};
pub use memory::{Capabilities, MemoryBackend, OpenBlocker};
pub use range::KeyRange;
pub use value::{Value, ValueKind};
