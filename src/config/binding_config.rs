use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::wait::retry::WaitPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "form-binder.yaml";

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-binder.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// How to start the browser driver process for a live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_script")]
    pub script: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            script: default_script(),
        }
    }
}

// Serde default helpers
fn default_timeout_ms() -> u64 { 5000 }
fn default_poll_interval_ms() -> u64 { 200 }
fn default_command() -> String { "node".to_string() }
fn default_script() -> String { "driver/browser_server.js".to_string() }

impl BindingConfig {
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.wait.timeout_ms),
            Duration::from_millis(self.wait.poll_interval_ms),
        )
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> BindingConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "ignoring malformed config file");
            BindingConfig::default()
        }),
        Err(_) => BindingConfig::default(),
    }
}
