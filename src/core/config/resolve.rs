use std::time::Duration;

use tracing::{debug, warn};

use super::data::{validate_temperature, ChatConfig, Config, Settings};
use super::defaults::*;
use super::io::{parse_bool, ConfigError};
use crate::core::credential::Credential;
use crate::core::keyring::{read_secret, KeyringAccessError};
use crate::utils::url::normalize_base_url;

/// Where settings come from besides the config file.
pub trait SettingsSource {
    fn var(&self, key: &str) -> Option<String>;
    fn stored_credential(&self) -> Result<Option<String>, KeyringAccessError>;
}

/// Process environment plus the platform keyring.
pub struct SystemSource;

impl SettingsSource for SystemSource {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    fn stored_credential(&self) -> Result<Option<String>, KeyringAccessError> {
        read_secret(KEYRING_SERVICE, KEYRING_USER)
    }
}

/// Command-line overrides; highest precedence.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub mock_mode: bool,
    pub system_prompt: Option<String>,
    pub mock_interval_ms: Option<u64>,
}

impl Settings {
    /// Resolve flags, then environment, then `config`, then the keyring
    /// (credential only), then defaults.
    pub fn resolve(
        config: &Config,
        overrides: &Overrides,
        source: &impl SettingsSource,
    ) -> Result<Settings, ConfigError> {
        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| source.var(ENV_BASE_URL))
            .or_else(|| config.base_url.clone())
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = overrides
            .model
            .clone()
            .or_else(|| source.var(ENV_MODEL))
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if !is_known_model(&model) {
            debug!(model = %model, "model is not in the built-in catalog");
        }

        let temperature = match overrides.temperature {
            Some(value) => value,
            None => match source.var(ENV_TEMPERATURE) {
                Some(raw) => raw
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| ConfigError::InvalidTemperature(raw.clone()))?,
                None => config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            },
        };
        let temperature = validate_temperature(temperature)?;

        let env_mock = match source.var(ENV_MOCK) {
            Some(raw) => Some(parse_bool(ENV_MOCK, &raw)?),
            None => None,
        };
        let mock_mode = overrides.mock_mode
            || env_mock.unwrap_or_else(|| config.mock_mode.unwrap_or(false));

        let system_prompt = overrides
            .system_prompt
            .clone()
            .or_else(|| config.system_prompt.clone())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let system_prompt = (!system_prompt.trim().is_empty()).then_some(system_prompt);

        let mock_interval = Duration::from_millis(
            overrides
                .mock_interval_ms
                .or(config.mock_interval_ms)
                .unwrap_or(DEFAULT_MOCK_INTERVAL_MS),
        );

        let credential = resolve_credential(config, source);
        debug!(
            base_url = %base_url,
            model = %model,
            temperature,
            mock_mode,
            credential = %credential
                .as_ref()
                .map(|c| c.summary().to_string())
                .unwrap_or_else(|| "none".to_string()),
            "resolved settings"
        );

        Ok(Settings {
            base_url,
            chat: ChatConfig { model, temperature },
            credential,
            mock_mode,
            system_prompt,
            mock_interval,
        })
    }
}

fn resolve_credential(config: &Config, source: &impl SettingsSource) -> Option<Credential> {
    if let Some(credential) = source
        .var(ENV_API_KEY)
        .as_deref()
        .and_then(Credential::from_configured)
    {
        return Some(credential);
    }

    if let Some(credential) = config
        .api_key
        .as_deref()
        .and_then(Credential::from_configured)
    {
        return Some(credential);
    }

    match source.stored_credential() {
        Ok(stored) => stored.as_deref().and_then(Credential::from_configured),
        Err(err) => {
            warn!(
                recoverable = err.is_recoverable(),
                error = %err,
                "could not read API key from keyring"
            );
            None
        }
    }
}
