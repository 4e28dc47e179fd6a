//! WhatsApp Cloud API schema definitions
//!
//! Inbound webhook payloads and the outbound send-message body. Every level
//! of the webhook payload is optional: Meta delivers status callbacks and
//! other change kinds on the same endpoint, and those must parse cleanly.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Webhook Verification
// ============================================================================

/// Query parameters sent by Meta on `GET /webhook`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,

    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,

    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// ============================================================================
// Inbound Webhook Payload
// ============================================================================

/// Top-level webhook notification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub entry: Vec<WebhookEntry>,
}

impl WebhookPayload {
    /// The message this service acts on: the first message of the first
    /// change of the first entry
    pub fn first_message(&self) -> Option<&InboundMessage> {
        self.entry
            .first()?
            .changes
            .first()?
            .value
            .as_ref()?
            .messages
            .first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub value: Option<ChangeValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messaging_product: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<InboundMessage>,
}

/// A single inbound message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender phone number in international format without `+`
    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub timestamp: Option<String>,

    /// Message kind: text, image, audio, interactive, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub text: Option<TextBody>,
}

impl InboundMessage {
    /// Trimmed text body for `type == "text"` messages; `None` for every
    /// other kind
    pub fn text_body(&self) -> Option<&str> {
        if self.kind.as_deref() != Some("text") {
            return None;
        }
        Some(
            self.text
                .as_ref()
                .map(|t| t.body.trim())
                .unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
}

// ============================================================================
// Outbound Send Message
// ============================================================================

/// Body POSTed to `/{phone_number_id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub messaging_product: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextBody,
}

impl SendMessageRequest {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            to: to.into(),
            kind: "text".to_string(),
            text: TextBody { body: body.into() },
        }
    }
}

/// Success body of the send-message call
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

impl SendMessageResponse {
    /// `wamid` of the accepted message
    pub fn message_id(&self) -> Option<&str> {
        self.messages.first().map(|m| m.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

/// Graph API error envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphError {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}
