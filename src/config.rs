// src/config.rs
// Environment-based configuration - single source of truth for all env vars

use thiserror::Error;
use tracing::debug;

use crate::gemini::{DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("PORT is not a valid port number: {0}")]
    InvalidPort(String),
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream API credential (GEMINI_API_KEY). Required.
    pub api_key: String,
    /// Listen port (PORT, default 3000).
    pub port: u16,
    /// Text-only model variant (GEMINI_TEXT_MODEL override).
    pub text_model: String,
    /// Vision model variant (GEMINI_VISION_MODEL override).
    pub vision_model: String,
}

impl Config {
    /// Load configuration from the environment. A missing or empty
    /// `GEMINI_API_KEY` is a fatal startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = read_var("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let port = match read_var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let text_model =
            read_var("GEMINI_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string());
        let vision_model =
            read_var("GEMINI_VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string());

        // Never log the key itself, only that it was found.
        debug!(port, %text_model, %vision_model, "configuration loaded, API key present");

        Ok(Self {
            api_key,
            port,
            text_model,
            vision_model,
        })
    }
}

/// Read a single variable, filtering empty values.
fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
