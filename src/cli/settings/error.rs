//! Error types for settings operations.

use std::fmt;

use crate::core::config::ConfigError;

/// Errors that can occur when modifying configuration settings.
#[derive(Debug)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The provided value could not be parsed as a boolean.
    InvalidBoolean(String),
    /// The provided value is not acceptable for this key.
    InvalidValue {
        key: &'static str,
        value: String,
        hint: &'static str,
    },
    /// Required arguments are missing.
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    /// An error occurred while loading or persisting the configuration.
    Config(ConfigError),
    /// The system keyring refused the operation.
    Keyring(String),
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Known keys: {}", super::SETTING_KEYS.join(", "));
            }
            SettingError::InvalidBoolean(input) => {
                eprintln!("❌ Invalid boolean value: {input}");
                eprintln!("   Use 'on' or 'off' (also accepts true/false, yes/no)");
            }
            SettingError::InvalidValue { key, value, hint } => {
                eprintln!("❌ Invalid value for {key}: {value}");
                eprintln!("   {hint}");
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            SettingError::Config(err) => {
                eprintln!("❌ {err}");
            }
            SettingError::Keyring(msg) => {
                eprintln!("❌ Could not store the API key in the system keyring: {msg}");
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SettingError::Config(_) | SettingError::Keyring(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::InvalidBoolean(input) => write!(f, "Invalid boolean value: {input}"),
            SettingError::InvalidValue { key, value, .. } => {
                write!(f, "Invalid value for {key}: {value}")
            }
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
            SettingError::Config(err) => write!(f, "Config error: {err}"),
            SettingError::Keyring(msg) => write!(f, "Keyring error: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SettingError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidBoolean { value, .. } => SettingError::InvalidBoolean(value),
            other => SettingError::Config(other),
        }
    }
}
