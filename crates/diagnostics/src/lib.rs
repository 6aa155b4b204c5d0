//! Structured logging for the kvfs workspace.
//!
//! Every crate logs through the macros below; the binary or test harness
//! decides whether anything is emitted by calling [`init`] once.
//!
//! The minimum level comes from the `KVFS_LOG` environment variable:
//! - `KVFS_LOG=off` (default) - silent
//! - `KVFS_LOG=error` / `warn` / `info` / `debug`

use std::str::FromStr;
use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`].
pub const LOG_ENV: &str = "KVFS_LOG";

static INIT: Once = Once::new();

/// Minimum level for emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl LogLevel {
    fn filter_level(self) -> Option<emit::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(emit::Level::Error),
            LogLevel::Warn => Some(emit::Level::Warn),
            LogLevel::Info => Some(emit::Level::Info),
            LogLevel::Debug => Some(emit::Level::Debug),
        }
    }
}

/// Initialize diagnostics from `KVFS_LOG`.
///
/// Safe to call repeatedly; only the first call has any effect. Unknown
/// values fall back to `info`.
pub fn init_diagnostics() {
    let raw = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
    let level = match raw.parse::<LogLevel>() {
        Ok(level) => level,
        Err(_) => {
            // No emitter exists yet, so this is the only channel available.
            eprintln!("Warning: Unknown {LOG_ENV} value '{raw}', using 'info'");
            LogLevel::Info
        }
    };
    init_with_level(level);
}

/// Initialize diagnostics with an explicit level, ignoring the environment.
pub fn init_with_level(level: LogLevel) {
    INIT.call_once(|| {
        let Some(min) = level.filter_level() else {
            return;
        };
        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min))
            .init();

        // The emitter lives for the whole process.
        std::mem::forget(rt);
    });
}

/// Log basic operations users may want to see (opens, upgrades, removals).
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed per-operation diagnostics.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems that were swallowed or worked around.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that are about to be returned to a caller.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("off".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert_eq!("".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" warn ".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_with_level(LogLevel::Debug);
        init_diagnostics();
    }

    #[test]
    fn test_macros_compile() {
        info!("Test message");
        debug!("Debug message with {value}", value: 42);
        warn!("Warning message");
        error!("Error message");
    }

    #[test]
    fn test_macros_take_locals_as_properties() {
        init_with_level(LogLevel::Debug);
        let path = "/a/b";
        let count = 3usize;
        let error = String::from("denied");
        debug!("Listed {path}: {count} entries", path: path, count: count);
        warn!("Failed on {path}: {error}", path: path, error: error);
    }
}
