//! Conversion between the data shapes callers hand in and ask for.

use crate::encoding::{Payload, binary_string_to_bytes, bytes_to_binary_string};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("Invalid base64 data: {0}")]
    Base64(String),

    #[error("Data is not valid UTF-8: {0}")]
    Utf8(String),

    #[error("Binary string holds a char above U+00FF")]
    BinaryString,
}

/// Data in one of the supported shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Opaque object
    Object(Bytes),
    Bytes(Vec<u8>),
    /// UTF-8 text
    Text(String),
    Base64(String),
    /// One char per byte
    BinaryString(String),
}

/// Shape a caller asks to receive data in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Object,
    Bytes,
    Text,
    Base64,
    BinaryString,
}

impl Source {
    #[must_use]
    pub fn source_type(&self) -> SourceType {
        match self {
            Source::Object(_) => SourceType::Object,
            Source::Bytes(_) => SourceType::Bytes,
            Source::Text(_) => SourceType::Text,
            Source::Base64(_) => SourceType::Base64,
            Source::BinaryString(_) => SourceType::BinaryString,
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, ConvertError> {
        to_bytes(self)
    }

    pub fn into_text(self) -> Result<String, ConvertError> {
        to_text(self)
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Text(text.to_string())
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::Text(text)
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Source::Bytes(bytes)
    }
}

impl From<&[u8]> for Source {
    fn from(bytes: &[u8]) -> Self {
        Source::Bytes(bytes.to_vec())
    }
}

impl From<Bytes> for Source {
    fn from(bytes: Bytes) -> Self {
        Source::Object(bytes)
    }
}

impl From<Payload> for Source {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Object(b) => Source::Object(b),
            Payload::Buffer(b) => Source::Bytes(b),
            Payload::Text(s) => Source::BinaryString(s),
        }
    }
}

pub fn to_bytes(source: Source) -> Result<Vec<u8>, ConvertError> {
    match source {
        Source::Object(b) => Ok(b.to_vec()),
        Source::Bytes(b) => Ok(b),
        Source::Text(s) => Ok(s.into_bytes()),
        Source::Base64(s) => STANDARD
            .decode(s.trim())
            .map_err(|e| ConvertError::Base64(e.to_string())),
        Source::BinaryString(s) => binary_string_to_bytes(&s).ok_or(ConvertError::BinaryString),
    }
}

pub fn to_text(source: Source) -> Result<String, ConvertError> {
    match source {
        Source::Text(s) => Ok(s),
        other => {
            String::from_utf8(to_bytes(other)?).map_err(|e| ConvertError::Utf8(e.to_string()))
        }
    }
}

pub fn to_base64(source: Source) -> Result<String, ConvertError> {
    match source {
        Source::Base64(s) => Ok(s),
        other => Ok(STANDARD.encode(to_bytes(other)?)),
    }
}

pub fn to_binary_string(source: Source) -> Result<String, ConvertError> {
    match source {
        Source::BinaryString(s) => Ok(s),
        other => Ok(bytes_to_binary_string(&to_bytes(other)?)),
    }
}

pub fn to_object(source: Source) -> Result<Bytes, ConvertError> {
    match source {
        Source::Object(b) => Ok(b),
        other => Ok(Bytes::from(to_bytes(other)?)),
    }
}

/// Convert `source` into the shape named by `to`.
pub fn convert(source: Source, to: SourceType) -> Result<Source, ConvertError> {
    if source.source_type() == to {
        return Ok(source);
    }
    Ok(match to {
        SourceType::Object => Source::Object(to_object(source)?),
        SourceType::Bytes => Source::Bytes(to_bytes(source)?),
        SourceType::Text => Source::Text(to_text(source)?),
        SourceType::Base64 => Source::Base64(to_base64(source)?),
        SourceType::BinaryString => Source::BinaryString(to_binary_string(source)?),
    })
}
