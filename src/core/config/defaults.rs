//! Built-in defaults and environment variable names.

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";
pub const DEFAULT_MOCK_INTERVAL_MS: u64 = 20;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;

pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_BASE_URL: &str = "DEEPSEEK_BASE_URL";
pub const ENV_MODEL: &str = "STREAMCHAT_MODEL";
pub const ENV_TEMPERATURE: &str = "STREAMCHAT_TEMPERATURE";
pub const ENV_MOCK: &str = "STREAMCHAT_MOCK";

pub const KEYRING_SERVICE: &str = "streamchat";
pub const KEYRING_USER: &str = "deepseek";

/// (display label, model id)
pub const AVAILABLE_MODELS: &[(&str, &str)] = &[
    ("DeepSeek Chat", "deepseek-chat"),
    ("DeepSeek Reasoner", "deepseek-reasoner"),
];

pub fn is_known_model(model: &str) -> bool {
    AVAILABLE_MODELS.iter().any(|(_, id)| *id == model)
}
