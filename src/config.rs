use crate::error::ConfigError;
use std::env;

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ELEVEN_LABS_API_BASE: &str = "https://api.elevenlabs.io";
pub const DEFAULT_VOICE_ID: &str = "azvlASSXXd9UGVnx5xu4";

/// Credentials and endpoints for the external capabilities, validated eagerly
/// so a misconfigured deployment fails before any run is attempted.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub openai_model: String,
    pub eleven_labs_api_key: String,
    pub eleven_labs_api_base: String,
    pub eleven_labs_voice_id: String,
    pub platform_api_base: String,
    pub platform_access_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ConfigError::MissingEnv(key)),
            }
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_api_base: optional("OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
            openai_model: optional("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            eleven_labs_api_key: required("ELEVEN_LABS_API_KEY")?,
            eleven_labs_api_base: optional("ELEVEN_LABS_API_BASE", DEFAULT_ELEVEN_LABS_API_BASE),
            eleven_labs_voice_id: optional("ELEVEN_LABS_VOICE_ID", DEFAULT_VOICE_ID),
            platform_api_base: required("PLATFORM_API_BASE")?,
            platform_access_token: required("PLATFORM_ACCESS_TOKEN")?,
        })
    }
}
