//! Message dispatch
//!
//! Decides what to answer for one inbound WhatsApp message: a canned reply
//! for the literal commands and non-text messages, otherwise the LLM's
//! completion for the conversation so far.

use std::sync::Arc;

use crate::schemas::openai::ChatMessage;
use crate::schemas::whatsapp::InboundMessage;
use crate::services::groq::ChatBackend;
use crate::services::history::ConversationHistory;
use crate::services::whatsapp::{MessageSender, WhatsAppError};
use crate::utils::truncate_with_suffix;

pub const HELP_REPLY: &str = "Commands: /help, /start, /reset";
pub const RESET_REPLY: &str = "History cleared. Carry on!";
pub const TEXT_ONLY_REPLY: &str = "For now I only understand text messages. Send me your question 🙂";
pub const EMPTY_COMPLETION_REPLY: &str = "Sorry, I couldn't come up with an answer right now.";
pub const LLM_FAILURE_REPLY: &str =
    "Oops! I had a problem talking to the model. Please try again in a few seconds.";

/// Literal text commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Help,
}

impl Command {
    /// Case-insensitive prefix match, so `/START now` is still `/start`
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.starts_with("/start") {
            Some(Command::Start)
        } else if lower.starts_with("/reset") {
            Some(Command::Reset)
        } else if lower.starts_with("/help") {
            Some(Command::Help)
        } else {
            None
        }
    }
}

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No sender to reply to
    Ignored,
    /// Non-text message, answered with the text-only notice
    NonText,
    Command(Command),
    /// LLM completion relayed
    Answered,
    /// LLM failed or answered empty; canned apology sent
    Fallback,
}

/// Routes inbound messages to canned replies or the LLM
pub struct BotService {
    llm: Arc<dyn ChatBackend>,
    sender: Arc<dyn MessageSender>,
    history: ConversationHistory,
    system_prompt: String,
}

impl BotService {
    pub fn new(
        llm: Arc<dyn ChatBackend>,
        sender: Arc<dyn MessageSender>,
        system_prompt: impl Into<String>,
        history_limit: usize,
    ) -> Self {
        Self {
            llm,
            sender,
            history: ConversationHistory::new(history_limit),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Handle one inbound message and send the reply
    pub async fn handle_message(&self, message: &InboundMessage) -> Result<Outcome, WhatsAppError> {
        let Some(from) = message.from.as_deref().filter(|f| !f.is_empty()) else {
            tracing::debug!(message_id = ?message.id, "Inbound message without sender, ignoring");
            return Ok(Outcome::Ignored);
        };

        let Some(text) = message.text_body() else {
            tracing::info!(
                from = %from,
                kind = %message.kind.as_deref().unwrap_or("-"),
                "Non-text message received"
            );
            self.sender.send_text(from, TEXT_ONLY_REPLY).await?;
            return Ok(Outcome::NonText);
        };

        tracing::info!(
            from = %from,
            preview = %truncate_with_suffix(text, 60, "..."),
            "Text message received"
        );

        if let Some(command) = Command::parse(text) {
            let reply = match command {
                Command::Start => self.greeting(),
                Command::Reset => {
                    self.history.clear(from);
                    RESET_REPLY.to_string()
                }
                Command::Help => HELP_REPLY.to_string(),
            };
            self.sender.send_text(from, &reply).await?;
            return Ok(Outcome::Command(command));
        }

        let (answer, outcome) = self.ask_llm(from, text).await;
        self.history.record_exchange(from, text, &answer);
        self.sender.send_text(from, &answer).await?;

        Ok(outcome)
    }

    fn greeting(&self) -> String {
        format!(
            "Hi! I'm a WhatsApp bot powered by {} on Groq. Send me your question.",
            self.llm.model_id()
        )
    }

    async fn ask_llm(&self, from: &str, text: &str) -> (String, Outcome) {
        let mut messages = Vec::with_capacity(2);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.extend(self.history.snapshot(from));
        messages.push(ChatMessage::user(text));

        match self.llm.complete(messages).await {
            Ok(Some(answer)) if !answer.is_empty() => (answer, Outcome::Answered),
            Ok(_) => {
                tracing::warn!(from = %from, "LLM returned an empty completion");
                (EMPTY_COMPLETION_REPLY.to_string(), Outcome::Fallback)
            }
            Err(e) => {
                tracing::error!(from = %from, error = %e, "LLM call failed");
                (LLM_FAILURE_REPLY.to_string(), Outcome::Fallback)
            }
        }
    }
}
