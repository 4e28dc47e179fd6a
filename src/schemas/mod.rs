//! Wire schemas for the two third-party APIs
//!
//! - `openai`: Groq's OpenAI-compatible chat completions
//! - `whatsapp`: WhatsApp Cloud API webhooks and send-message

pub mod openai;
pub mod whatsapp;
