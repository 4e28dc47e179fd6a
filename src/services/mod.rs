//! Services module
//!
//! Contains business logic and external service integrations.

pub mod bot;
pub mod groq;
pub mod history;
pub mod whatsapp;

pub use bot::{BotService, Command, Outcome};
pub use groq::{ChatBackend, GroqError, GroqService};
pub use history::ConversationHistory;
pub use whatsapp::{MessageSender, WhatsAppError, WhatsAppService};
