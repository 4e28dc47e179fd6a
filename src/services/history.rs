//! Short per-sender conversation history
//!
//! Each sender gets a ring of the most recent chat turns, kept in process
//! memory only. The lock is never held across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::schemas::openai::ChatMessage;

/// In-memory conversation history keyed by sender phone number
#[derive(Debug)]
pub struct ConversationHistory {
    limit: usize,
    turns: Mutex<HashMap<String, VecDeque<ChatMessage>>>,
}

impl ConversationHistory {
    /// `limit` is the number of messages kept per sender; user and assistant
    /// turns both count
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            turns: Mutex::new(HashMap::new()),
        }
    }

    /// Copy of the sender's history, oldest first
    pub fn snapshot(&self, sender: &str) -> Vec<ChatMessage> {
        let turns = self.turns.lock().unwrap_or_else(|e| e.into_inner());
        turns
            .get(sender)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append one user/assistant exchange, dropping the oldest turns past the limit
    pub fn record_exchange(&self, sender: &str, user: &str, assistant: &str) {
        let mut turns = self.turns.lock().unwrap_or_else(|e| e.into_inner());
        let ring = turns.entry(sender.to_string()).or_default();

        ring.push_back(ChatMessage::user(user));
        ring.push_back(ChatMessage::assistant(assistant));
        while ring.len() > self.limit {
            ring.pop_front();
        }
    }

    pub fn clear(&self, sender: &str) {
        let mut turns = self.turns.lock().unwrap_or_else(|e| e.into_inner());
        turns.remove(sender);
    }

    /// Number of senders with a non-empty history
    pub fn sender_count(&self) -> usize {
        self.turns.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
