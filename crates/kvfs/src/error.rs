// Error types for kvfs operations

use crate::convert::ConvertError;
use kvstore::StoreError;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a failure, independent of where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    TypeMismatch,
    NotReadable,
    NoModificationAllowed,
    Aborted,
    Blocked,
    NotSupported,
    OperationError,
    InvalidPath,
    AlreadyExists,
    InvalidConfig,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Type mismatch at {path}: {message}")]
    TypeMismatch { path: String, message: String },

    #[error("Cannot read {path}: {source}")]
    NotReadable { path: String, source: StoreError },

    #[error("Cannot modify {path}: {source}")]
    NoModificationAllowed { path: String, source: StoreError },

    #[error("Transaction aborted at {path}: {source}")]
    Aborted { path: String, source: StoreError },

    #[error("Opening {repository} blocked for {waited_ms} ms")]
    Blocked { repository: String, waited_ms: u64 },

    #[error("Not supported at {path}: {message}")]
    NotSupported { path: String, message: String },

    #[error("Operation failed at {path}: {message}")]
    OperationError { path: String, message: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Entry already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found<P: AsRef<str>>(path: P) -> Self {
        Error::NotFound {
            path: path.as_ref().to_string(),
        }
    }

    pub fn type_mismatch<P: AsRef<str>, M: Into<String>>(path: P, message: M) -> Self {
        Error::TypeMismatch {
            path: path.as_ref().to_string(),
            message: message.into(),
        }
    }

    /// Substrate failure during a read. Aborts keep their own kind.
    pub fn read<P: AsRef<str>>(path: P, source: StoreError) -> Self {
        let path = path.as_ref().to_string();
        if source.is_abort() {
            Error::Aborted { path, source }
        } else {
            Error::NotReadable { path, source }
        }
    }

    /// Substrate failure during a write. Aborts keep their own kind.
    pub fn write<P: AsRef<str>>(path: P, source: StoreError) -> Self {
        let path = path.as_ref().to_string();
        if source.is_abort() {
            Error::Aborted { path, source }
        } else {
            Error::NoModificationAllowed { path, source }
        }
    }

    pub fn not_supported<P: AsRef<str>, M: Into<String>>(path: P, message: M) -> Self {
        Error::NotSupported {
            path: path.as_ref().to_string(),
            message: message.into(),
        }
    }

    pub fn operation<P: AsRef<str>, M: Into<String>>(path: P, message: M) -> Self {
        Error::OperationError {
            path: path.as_ref().to_string(),
            message: message.into(),
        }
    }

    pub fn conversion<P: AsRef<str>>(path: P, source: ConvertError) -> Self {
        Error::operation(path, source.to_string())
    }

    pub fn invalid_path<P: AsRef<str>>(path: P) -> Self {
        Error::InvalidPath {
            path: path.as_ref().to_string(),
        }
    }

    pub fn already_exists<P: AsRef<str>>(path: P) -> Self {
        Error::AlreadyExists {
            path: path.as_ref().to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::NotReadable { .. } => ErrorKind::NotReadable,
            Error::NoModificationAllowed { .. } => ErrorKind::NoModificationAllowed,
            Error::Aborted { .. } => ErrorKind::Aborted,
            Error::Blocked { .. } => ErrorKind::Blocked,
            Error::NotSupported { .. } => ErrorKind::NotSupported,
            Error::OperationError { .. } => ErrorKind::OperationError,
            Error::InvalidPath { .. } => ErrorKind::InvalidPath,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::Config(_) => ErrorKind::InvalidConfig,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The path the failure is about, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::NotFound { path }
            | Error::TypeMismatch { path, .. }
            | Error::NotReadable { path, .. }
            | Error::NoModificationAllowed { path, .. }
            | Error::Aborted { path, .. }
            | Error::NotSupported { path, .. }
            | Error::OperationError { path, .. }
            | Error::InvalidPath { path }
            | Error::AlreadyExists { path } => Some(path),
            Error::Blocked { .. } | Error::Config(_) => None,
        }
    }
}
