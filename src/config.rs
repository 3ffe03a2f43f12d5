use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine-wide tuning shared by every form a host mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet interval before the settle tier fires.
    pub debounce_ms: u64,
    /// Viewport widths strictly below this open fields in a fullscreen dialog.
    pub dialog_breakpoint: u32,
    /// Option lists shorter than this open on focus instead of on typing.
    pub searchable_threshold: usize,
    pub max_upload_bytes: u64,
    pub expand_groups: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            dialog_breakpoint: 600,
            searchable_threshold: 8,
            max_upload_bytes: 10 * 1024 * 1024,
            expand_groups: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(input)?;
        config.checked()
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.checked()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn is_narrow(&self, viewport_width: u32) -> bool {
        viewport_width < self.dialog_breakpoint
    }

    fn checked(self) -> Result<Self, ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
