use bytes::Bytes;
use kvstore::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Representation used to store file contents.
///
/// Chosen once per connection by probing the store, in this order of
/// preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadEncoding {
    OpaqueObject,
    RawBuffer,
    /// One char per byte, U+0000..=U+00FF
    EmbeddedString,
}

impl PayloadEncoding {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadEncoding::OpaqueObject => "opaque-object",
            PayloadEncoding::RawBuffer => "raw-buffer",
            PayloadEncoding::EmbeddedString => "embedded-string",
        }
    }
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File contents as stored in the content table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Object(Bytes),
    Buffer(Vec<u8>),
    /// Binary string, see [`PayloadEncoding::EmbeddedString`]
    Text(String),
}

impl Payload {
    #[must_use]
    pub fn encode(bytes: Vec<u8>, encoding: PayloadEncoding) -> Self {
        match encoding {
            PayloadEncoding::OpaqueObject => Payload::Object(Bytes::from(bytes)),
            PayloadEncoding::RawBuffer => Payload::Buffer(bytes),
            PayloadEncoding::EmbeddedString => Payload::Text(bytes_to_binary_string(&bytes)),
        }
    }

    #[must_use]
    pub fn encoding(&self) -> PayloadEncoding {
        match self {
            Payload::Object(_) => PayloadEncoding::OpaqueObject,
            Payload::Buffer(_) => PayloadEncoding::RawBuffer,
            Payload::Text(_) => PayloadEncoding::EmbeddedString,
        }
    }

    /// Length in bytes of the decoded contents
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Payload::Object(b) => b.len(),
            Payload::Buffer(b) => b.len(),
            Payload::Text(s) => s.chars().count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode to bytes. Fails only for a string holding a char above U+00FF.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Payload::Object(b) => Some(b.to_vec()),
            Payload::Buffer(b) => Some(b),
            Payload::Text(s) => binary_string_to_bytes(&s),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Payload::Object(b) => Value::Object(b),
            Payload::Buffer(b) => Value::Buffer(b),
            Payload::Text(s) => Value::Text(s),
        }
    }

    /// `None` for a structured record, which is never file contents.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(b) => Some(Payload::Object(b)),
            Value::Buffer(b) => Some(Payload::Buffer(b)),
            Value::Text(s) => Some(Payload::Text(s)),
            Value::Record(_) => None,
        }
    }
}

#[must_use]
pub fn bytes_to_binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[must_use]
pub fn binary_string_to_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}
