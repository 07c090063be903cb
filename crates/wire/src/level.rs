//! Level — the fixed severity/kind enumeration for log events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Log,
    Info,
    Warn,
    Error,
    Debug,
    Trace,
    Time,
    Network,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Log => "log",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
            Level::Trace => "trace",
            Level::Time => "time",
            Level::Network => "network",
        }
    }

    /// Coerce a raw wire-level string to a known level.
    /// Unrecognized or absent levels become `Log`.
    pub fn coerce(raw: Option<&str>) -> Level {
        match raw {
            Some("log") => Level::Log,
            Some("info") => Level::Info,
            Some("warn") => Level::Warn,
            Some("error") => Level::Error,
            Some("debug") => Level::Debug,
            Some("trace") => Level::Trace,
            Some("time") => Level::Time,
            Some("network") => Level::Network,
            _ => Level::Log,
        }
    }
}
