//! Model — HubConfig and related structs.

use serde::{Deserialize, Serialize};
use wire::{CaptureOptions, ConfigUpdate};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub host: String,
    pub port: u16,
    /// Ring-buffer capacity of the log store.
    pub max_log_entries: usize,
    pub network_enabled: bool,
    pub capture_errors: bool,
    pub capture: CaptureOptions,
    pub path_mappings: Vec<PathMappingConfig>,
    pub workspace_roots: Vec<String>,
}

/// One prefix-substitution rule; first matching prefix wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathMappingConfig {
    pub url_prefix: String,
    pub local_path_prefix: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4780,
            max_log_entries: 10_000,
            network_enabled: true,
            capture_errors: true,
            capture: CaptureOptions::default(),
            path_mappings: Vec::new(),
            workspace_roots: Vec::new(),
        }
    }
}

impl HubConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The portion of the config broadcast to connected probes.
    pub fn client_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            network_enabled: Some(self.network_enabled),
            capture_errors: Some(self.capture_errors),
            log_capture_options: Some(self.capture),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.max_log_entries == 0 {
            return Err("max_log_entries must be > 0".to_string());
        }
        self.capture.validate()?;
        for mapping in &self.path_mappings {
            if mapping.url_prefix.is_empty() {
                return Err("path_mappings entries must have a non-empty url_prefix".to_string());
            }
        }
        Ok(())
    }
}
