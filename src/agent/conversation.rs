//! Agent conversation memory

use crate::agent::types::{Message, Role};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prior turns remembered by the tool agent.
///
/// Only user queries and final assistant replies are kept; intermediate tool
/// traffic from a run is not replayed into later runs.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Unique conversation ID, regenerated on clear
    pub id: Uuid,
    /// Remembered messages, oldest first
    messages: Vec<Message>,
    /// When the conversation started, reset on clear
    pub created_at: DateTime<Utc>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Conversation {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Record one completed turn
    pub fn record_turn(&mut self, query: impl Into<String>, reply: impl Into<String>) {
        self.messages.push(Message::user(query));
        self.messages.push(Message::assistant(reply));
    }

    /// Remembered messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of completed turns
    pub fn turn_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    /// Clear all messages and start a fresh conversation id
    pub fn clear(&mut self) {
        self.messages.clear();
        self.id = Uuid::new_v4();
        self.created_at = Utc::now();
    }

    /// Check if conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
