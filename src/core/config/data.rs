use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::defaults::{MAX_TEMPERATURE, MIN_TEMPERATURE};
use super::io::ConfigError;
use crate::core::credential::Credential;

/// Model selection for one request. Immutable once a request starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
}

impl ChatConfig {
    pub fn new(model: impl Into<String>, temperature: f32) -> Result<Self, ConfigError> {
        validate_temperature(temperature)?;
        Ok(Self {
            model: model.into(),
            temperature,
        })
    }
}

pub fn validate_temperature(temperature: f32) -> Result<f32, ConfigError> {
    if temperature.is_finite() && (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(ConfigError::InvalidTemperature(temperature.to_string()))
    }
}

/// Contents of `config.toml`. Every field is optional; unset values fall
/// through to the environment and then to built-in defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Stored in plain text; prefer the environment or the system keyring.
    pub api_key: Option<String>,
    pub mock_mode: Option<bool>,
    pub system_prompt: Option<String>,
    pub mock_interval_ms: Option<u64>,
}

/// Fully resolved configuration for a completion client.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub chat: ChatConfig,
    pub credential: Option<Credential>,
    pub mock_mode: bool,
    pub system_prompt: Option<String>,
    pub mock_interval: Duration,
}

pub(crate) fn path_display(path: &Path) -> String {
    path.display().to_string()
}
