use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

#[must_use]
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Metadata record of one file or directory.
///
/// A record without `size` is a directory. A record with `deleted` set is
/// a tombstone and is treated as absent by every reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub created: Timestamp,
    #[serde(default)]
    pub modified: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessed: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Timestamp>,
}

impl Stats {
    #[must_use]
    pub fn directory(now: Timestamp) -> Self {
        Self {
            created: now,
            modified: now,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn file(now: Timestamp, size: u64) -> Self {
        Self {
            created: now,
            modified: now,
            size: Some(size),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.size.is_none()
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.size.is_some()
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Overwrite the fields present in `patch`, keeping the rest.
    pub fn apply(&mut self, patch: &StatsPatch) {
        if let Some(created) = patch.created {
            self.created = created;
        }
        if let Some(modified) = patch.modified {
            self.modified = modified;
        }
        if let Some(accessed) = patch.accessed {
            self.accessed = Some(accessed);
        }
        if let Some(size) = patch.size {
            self.size = Some(size);
        }
        if let Some(etag) = &patch.etag {
            self.etag = Some(etag.clone());
        }
        if let Some(deleted) = patch.deleted {
            self.deleted = Some(deleted);
        }
    }
}

/// Partial update of a [`Stats`] record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessed: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Timestamp>,
}

impl StatsPatch {
    #[must_use]
    pub fn accessed(at: Timestamp) -> Self {
        Self {
            accessed: Some(at),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn deleted(at: Timestamp) -> Self {
        Self {
            deleted: Some(at),
            ..Default::default()
        }
    }
}
