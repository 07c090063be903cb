//! CaptureOptions and the server→client config payload.

use serde::{Deserialize, Serialize};

/// Bounds applied by the value serializer on the probe side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureOptions {
    /// Maximum container nesting before collapsing to a shallow marker.
    pub max_depth: usize,
    /// Maximum own keys serialized per mapping.
    pub max_props: usize,
    /// Maximum elements serialized per sequence.
    pub max_array: usize,
    /// Maximum characters per string before truncation.
    pub max_string_length: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_props: 50,
            max_array: 100,
            max_string_length: 500,
        }
    }
}

impl CaptureOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("capture.max_depth must be > 0".to_string());
        }
        if self.max_props == 0 {
            return Err("capture.max_props must be > 0".to_string());
        }
        if self.max_array == 0 {
            return Err("capture.max_array must be > 0".to_string());
        }
        if self.max_string_length == 0 {
            return Err("capture.max_string_length must be > 0".to_string());
        }
        Ok(())
    }
}

/// Partial config pushed to clients in a `config` frame.
/// Present keys override, absent keys are retained (shallow merge).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_errors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_capture_options: Option<CaptureOptions>,
}
