//! LogEventPayload — the body of a `log` wire frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One captured occurrence as transmitted by a probe.
///
/// Every field is optional on the wire; the hub applies defaults at
/// ingestion (level coercion, kind fallback, ingestion-time timestamp).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Sub-classification driving presentation (`network`, `time`, ...).
    /// Defaults to the level when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Human-readable preview string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Serialized values, already bounded by the probe's capture options.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,

    /// Milliseconds since epoch, producer-supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,

    /// Raw stack trace text, machinery frames already filtered out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    // Domain-specific fields (network / timer events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Producer environment tag (e.g. "server", "browser").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
