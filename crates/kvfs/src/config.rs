use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What removing an entry does to its metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Delete the record
    #[default]
    Hard,
    /// Keep the record with a `deleted` timestamp
    Soft,
}

/// Filesystem options, usually loaded from YAML.
///
/// ```yaml
/// noatime: true
/// delete_mode: soft
/// open_timeout_ms: 2000
/// read_chunk_size: 65536
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FsOptions {
    /// Skip the access-time update on reads
    pub noatime: bool,
    pub delete_mode: DeleteMode,
    /// How long an open may wait on other holders before failing
    pub open_timeout_ms: u64,
    /// Default read size for read streams
    pub read_chunk_size: usize,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            noatime: false,
            delete_mode: DeleteMode::Hard,
            open_timeout_ms: 5000,
            read_chunk_size: 64 * 1024,
        }
    }
}

impl FsOptions {
    /// Parse and validate options from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let options: FsOptions = serde_yaml_ng::from_str(text)
            .map_err(|e| Error::Config(format!("Failed to parse YAML options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!(
                "Failed to read options file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.open_timeout_ms == 0 {
            return Err(Error::Config(
                "open_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(Error::Config(
                "read_chunk_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    #[must_use]
    pub fn with_noatime(mut self, noatime: bool) -> Self {
        self.noatime = noatime;
        self
    }

    #[must_use]
    pub fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    #[must_use]
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
