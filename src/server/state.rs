//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::Settings;
use crate::services::{BotService, GroqService, WhatsAppService};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Cheaply cloneable; every field is behind an `Arc` or `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Message dispatcher with its LLM and WhatsApp clients
    pub bot: Arc<BotService>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state wired to the real Groq and WhatsApp APIs
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        tracing::debug!("Creating Groq client");
        let groq = GroqService::new(&settings.llm).context("Failed to build Groq client")?;

        tracing::debug!("Creating WhatsApp client");
        let whatsapp = WhatsAppService::new(&settings.whatsapp, settings.simulate())
            .context("Failed to build WhatsApp client")?;

        let bot = BotService::new(
            Arc::new(groq),
            Arc::new(whatsapp),
            settings.llm.system_prompt.clone(),
            settings.history_limit,
        );

        tracing::info!("Application state initialized successfully");

        Ok(Self::with_bot(settings, bot))
    }

    /// Build state around an already-wired bot
    pub fn with_bot(settings: Settings, bot: BotService) -> Self {
        Self {
            settings: Arc::new(settings),
            bot: Arc::new(bot),
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Constant-time comparison against the configured verify token
    ///
    /// Every byte is compared regardless of where the first mismatch is, so
    /// response timing does not reveal how much of a guessed token was right.
    /// Only the length can leak.
    pub fn verify_token_matches(&self, candidate: &str) -> bool {
        let expected = self.settings.whatsapp.verify_token.as_bytes();
        let candidate = candidate.as_bytes();

        expected.len() == candidate.len()
            && expected
                .iter()
                .zip(candidate)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_settings() {
        let state = AppState::new(Settings::for_tests()).unwrap();
        assert_eq!(state.bot.model_id(), "llama-3.1-8b-instant");
        assert!(state.uptime_seconds() < 5);
    }

    #[test]
    fn test_verify_token_matches() {
        let state = AppState::new(Settings::for_tests()).unwrap();
        assert!(state.verify_token_matches("verify-me"));
        assert!(!state.verify_token_matches("verify-mf"));
        assert!(!state.verify_token_matches("verify"));
        assert!(!state.verify_token_matches(""));
    }
}
