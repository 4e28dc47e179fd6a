//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Default Groq model
pub const DEFAULT_MODEL_ID: &str = "llama-3.1-8b-instant";

/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Meta Graph API base used by the WhatsApp Cloud API
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com/v19.0";

/// Default system prompt prepended to every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "Answer objectively and helpfully, in the language the user writes in.";

/// `WHATSAPP_TOKEN` value that switches outbound sends to log-only mode
pub const SIMULATE_TOKEN: &str = "FAKE";

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// WhatsApp Cloud API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhatsAppConfig {
    /// Shared secret echoed back by Meta during webhook verification
    #[serde(skip_serializing)]
    pub verify_token: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub phone_number_id: String,
    pub graph_base_url: String,
    pub timeout_seconds: u64,
}

/// Groq chat-completion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model_id: String,
    pub base_url: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    pub whatsapp: WhatsAppConfig,
    pub llm: LlmConfig,

    /// Messages kept per sender (user and assistant turns both count)
    pub history_limit: usize,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .with_context(|| format!("Missing {} in the environment", key))
        };

        let settings = Self {
            // App settings
            app_name: var_or("APP_NAME", "whatsapp-groq-bot"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: var_or("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: var_or("LOG_LEVEL", "info"),

            // Server settings
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            whatsapp: WhatsAppConfig {
                verify_token: required("APP_VERIFY_TOKEN")?,
                access_token: required("WHATSAPP_TOKEN")?,
                phone_number_id: required("WHATSAPP_PHONE_NUMBER_ID")?,
                graph_base_url: var_or("GRAPH_BASE_URL", DEFAULT_GRAPH_BASE_URL),
                timeout_seconds: var_or("HTTP_TIMEOUT_SECONDS", "20")
                    .parse()
                    .context("Invalid HTTP_TIMEOUT_SECONDS value")?,
            },

            llm: LlmConfig {
                api_key: required("GROQ_API_KEY")?,
                model_id: var_or("MODEL_ID", DEFAULT_MODEL_ID),
                base_url: var_or("GROQ_BASE_URL", DEFAULT_GROQ_BASE_URL),
                system_prompt: var_or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
                temperature: var_or("LLM_TEMPERATURE", "0.6")
                    .parse()
                    .context("Invalid LLM_TEMPERATURE value")?,
                max_tokens: var_or("LLM_MAX_TOKENS", "512")
                    .parse()
                    .context("Invalid LLM_MAX_TOKENS value")?,
                timeout_seconds: var_or("LLM_TIMEOUT_SECONDS", "60")
                    .parse()
                    .context("Invalid LLM_TIMEOUT_SECONDS value")?,
            },

            history_limit: var_or("HISTORY_LIMIT", "10")
                .parse()
                .context("Invalid HISTORY_LIMIT value")?,
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("LLM temperature must be between 0 and 2");
        }
        if self.llm.max_tokens == 0 {
            anyhow::bail!("LLM max_tokens must be > 0");
        }
        if self.llm.timeout_seconds == 0 || self.whatsapp.timeout_seconds == 0 {
            anyhow::bail!("HTTP timeouts must be > 0");
        }
        if self.history_limit == 0 {
            anyhow::bail!("History limit must be > 0");
        }

        if self.environment == Environment::Production && self.simulate() {
            tracing::warn!("Running in production with WHATSAPP_TOKEN=FAKE, replies will not be delivered!");
        }

        Ok(())
    }

    /// Whether outbound WhatsApp sends are only logged
    pub fn simulate(&self) -> bool {
        self.whatsapp.access_token == SIMULATE_TOKEN
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
impl Settings {
    /// Settings with dummy credentials, for unit tests elsewhere in the crate
    pub(crate) fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "APP_VERIFY_TOKEN" => Some("verify-me".to_string()),
            "WHATSAPP_TOKEN" => Some("wa-token".to_string()),
            "WHATSAPP_PHONE_NUMBER_ID" => Some("1234567890".to_string()),
            "GROQ_API_KEY" => Some("gsk_test".to_string()),
            _ => None,
        })
        .expect("test settings are valid")
    }
}
