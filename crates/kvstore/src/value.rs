use bytes::Bytes;
use std::fmt;

/// A record value as held by a table.
///
/// The three binary variants are mutually exclusive ways of storing the
/// same bytes; which of them a given store accepts is a property of the
/// store and has to be discovered at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Structured record (a cloned plain object)
    Record(serde_json::Value),
    /// Opaque binary object
    Object(Bytes),
    /// Raw byte buffer
    Buffer(Vec<u8>),
    /// String
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Record,
    Object,
    Buffer,
    Text,
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Record(_) => ValueKind::Record,
            Value::Object(_) => ValueKind::Object,
            Value::Buffer(_) => ValueKind::Buffer,
            Value::Text(_) => ValueKind::Text,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Record => "record",
            ValueKind::Object => "opaque object",
            ValueKind::Buffer => "raw buffer",
            ValueKind::Text => "string",
        };
        f.write_str(name)
    }
}
