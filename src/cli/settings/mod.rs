//! Settings management for the `config` subcommands.
//!
//! Edits go through [`set_value`] / [`unset_value`] on an in-memory
//! [`Config`]; the caller decides where it is persisted.

pub mod error;

pub use error::SettingError;

use crate::core::config::data::validate_temperature;
use crate::core::config::defaults::is_known_model;
use crate::core::config::io::parse_bool;
use crate::core::config::Config;
use crate::core::credential::CredentialSummary;
use crate::utils::url::normalize_base_url;

pub const SETTING_KEYS: &[&str] = &[
    "base-url",
    "model",
    "temperature",
    "api-key",
    "mock-mode",
    "system-prompt",
    "mock-interval-ms",
];

fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

fn success_unset(key: &str) -> String {
    format!("✅ Unset {key}")
}

/// Apply `key = value` to `config` and return the message to show the user.
pub fn set_value(config: &mut Config, key: &str, value: &str) -> Result<String, SettingError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SettingError::MissingArgs {
            hint: "Specify a value to set:",
            example: "streamchat config set model deepseek-chat",
        });
    }

    match key {
        "base-url" => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(SettingError::InvalidValue {
                    key: "base-url",
                    value: value.to_string(),
                    hint: "Use an http:// or https:// URL, e.g. https://api.deepseek.com/v1",
                });
            }
            let url = normalize_base_url(value);
            let message = success_set(key, &url);
            config.base_url = Some(url);
            Ok(message)
        }
        "model" => {
            let mut message = success_set(key, value);
            if !is_known_model(value) {
                message.push_str(" (not in the built-in catalog)");
            }
            config.model = Some(value.to_string());
            Ok(message)
        }
        "temperature" => {
            let temperature = value
                .parse::<f32>()
                .ok()
                .and_then(|parsed| validate_temperature(parsed).ok())
                .ok_or_else(|| SettingError::InvalidValue {
                    key: "temperature",
                    value: value.to_string(),
                    hint: "Use a number between 0.0 and 2.0",
                })?;
            config.temperature = Some(temperature);
            Ok(success_set(key, &temperature.to_string()))
        }
        "api-key" => {
            let summary = CredentialSummary::of(value);
            config.api_key = Some(value.to_string());
            Ok(format!(
                "{} (stored in plain text; `streamchat config set-key` uses the system keyring)",
                success_set(key, &summary.to_string())
            ))
        }
        "mock-mode" => {
            let enabled = parse_bool("mock-mode", value)?;
            config.mock_mode = Some(enabled);
            Ok(success_set(key, if enabled { "on" } else { "off" }))
        }
        "system-prompt" => {
            config.system_prompt = Some(value.to_string());
            Ok(success_set(key, value))
        }
        "mock-interval-ms" => {
            let interval = value
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| SettingError::InvalidValue {
                    key: "mock-interval-ms",
                    value: value.to_string(),
                    hint: "Use a positive whole number of milliseconds",
                })?;
            config.mock_interval_ms = Some(interval);
            Ok(success_set(key, &interval.to_string()))
        }
        other => Err(SettingError::UnknownKey(other.to_string())),
    }
}

pub fn unset_value(config: &mut Config, key: &str) -> Result<String, SettingError> {
    match key {
        "base-url" => config.base_url = None,
        "model" => config.model = None,
        "temperature" => config.temperature = None,
        "api-key" => config.api_key = None,
        "mock-mode" => config.mock_mode = None,
        "system-prompt" => config.system_prompt = None,
        "mock-interval-ms" => config.mock_interval_ms = None,
        other => return Err(SettingError::UnknownKey(other.to_string())),
    }
    Ok(success_unset(key))
}

/// One line per key, in [`SETTING_KEYS`] order. The API key is summarized.
pub fn format_config(config: &Config) -> Vec<String> {
    fn line(key: &str, value: Option<String>) -> String {
        format!("  {key}: {}", value.unwrap_or_else(|| "(unset)".to_string()))
    }

    vec![
        line("base-url", config.base_url.clone()),
        line("model", config.model.clone()),
        line("temperature", config.temperature.map(|t| t.to_string())),
        line(
            "api-key",
            config
                .api_key
                .as_deref()
                .map(|key| CredentialSummary::of(key).to_string()),
        ),
        line(
            "mock-mode",
            config
                .mock_mode
                .map(|on| if on { "on" } else { "off" }.to_string()),
        ),
        line("system-prompt", config.system_prompt.clone()),
        line(
            "mock-interval-ms",
            config.mock_interval_ms.map(|ms| ms.to_string()),
        ),
    ]
}
