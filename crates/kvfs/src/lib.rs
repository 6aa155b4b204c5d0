//! kvfs - a hierarchical filesystem on a transactional key-value store
//!
//! Two tables carry the whole tree. The entry table maps every absolute
//! path to its [`Stats`] record, the content table maps every file path
//! to its payload. Directories have no record of their children; a
//! listing is a range scan over the entry table.
//!
//! Everything goes through [`KvFs`]:
//!
//! ```no_run
//! # async fn demo() -> kvfs::Result<()> {
//! use kvfs::{FsOptions, KvFs};
//! use kvstore::MemoryBackend;
//! use std::sync::Arc;
//!
//! let fs = KvFs::new(Arc::new(MemoryBackend::new()), "demo", FsOptions::default())?;
//! let _ = fs.mkdir("/notes", false).await?;
//! let _ = fs.write_all("/notes/today.txt", "hello").await?;
//! assert_eq!(fs.read_text("/notes/today.txt").await?, "hello");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod content;
pub mod convert;
pub mod encoding;
pub mod engine;
pub mod entry;
pub mod error;
pub mod fs;
pub mod path;
pub mod probe;
pub mod scan;
pub mod stats;
pub mod stream;

pub use config::{DeleteMode, FsOptions};
pub use connection::{CONTENT_TABLE, ENTRY_TABLE, SCRATCH_TABLE};
pub use convert::{ConvertError, Source, SourceType};
pub use encoding::{Payload, PayloadEncoding};
pub use engine::{SaveOptions, SaveOutcome};
pub use error::{Error, ErrorKind, Result};
pub use fs::{KvFs, ObjectUrl, UrlMethod};
pub use stats::{Stats, StatsPatch, Timestamp};
pub use stream::{ReadStream, WriteOptions, WriteStream};

#[cfg(test)]
mod tests;
