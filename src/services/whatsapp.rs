//! WhatsApp Cloud API messaging service
//!
//! Sends text replies through `POST {graph_base}/{phone_number_id}/messages`.
//! With `WHATSAPP_TOKEN=FAKE` the service runs in simulate mode and only logs
//! what it would have sent.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::WhatsAppConfig;
use crate::schemas::whatsapp::{GraphErrorResponse, SendMessageRequest, SendMessageResponse};
use crate::utils::truncate_with_suffix;

/// Characters of a simulated reply that make it into the log
const SIMULATE_PREVIEW_CHARS: usize = 120;

/// Errors that can occur when calling the WhatsApp Cloud API
#[derive(Error, Debug)]
pub enum WhatsAppError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Graph API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Outbound side of the conversation
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError>;
}

/// Client for the WhatsApp Cloud API
#[derive(Clone)]
pub struct WhatsAppService {
    client: Client,
    messages_url: String,
    access_token: String,
    simulate: bool,
}

impl WhatsAppService {
    pub fn new(config: &WhatsAppConfig, simulate: bool) -> Result<Self, WhatsAppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let messages_url = format!(
            "{}/{}/messages",
            config.graph_base_url.trim_end_matches('/'),
            config.phone_number_id
        );

        if simulate {
            tracing::warn!("WhatsApp simulate mode enabled, replies will only be logged");
        } else {
            tracing::info!(url = %messages_url, "Initialized WhatsApp service");
        }

        Ok(Self {
            client,
            messages_url,
            access_token: config.access_token.clone(),
            simulate,
        })
    }

    pub fn is_simulated(&self) -> bool {
        self.simulate
    }
}

#[async_trait]
impl MessageSender for WhatsAppService {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError> {
        if self.simulate {
            tracing::info!(
                to = %to,
                preview = %truncate_with_suffix(body, SIMULATE_PREVIEW_CHARS, "..."),
                "[SIMULATE] reply not sent"
            );
            return Ok(());
        }

        let resp = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&SendMessageRequest::text(to, body))
            .send()
            .await?;

        let status = resp.status();
        let response_text = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<GraphErrorResponse>(&response_text)
                .map(|e| e.error.message)
                .unwrap_or(response_text);
            return Err(WhatsAppError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendMessageResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, body = %response_text, "Failed to parse WhatsApp response");
            WhatsAppError::ParseError(e.to_string())
        })?;

        tracing::debug!(
            to = %to,
            message_id = %sent.message_id().unwrap_or("-"),
            chars = body.chars().count(),
            "WhatsApp message sent"
        );
        Ok(())
    }
}
