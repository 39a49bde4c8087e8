//! Conversational task assistant.
//!
//! The assistant receives the conversation history plus a read-only snapshot
//! of the full task list and streams advisory text back. Nothing it returns
//! is ever written into the task store, and its failures stay inside the
//! conversation as an error message.

mod client;
mod stream;

pub use client::{AskOutcome, AssistantClient};
pub use stream::StreamDecoder;

use serde::{Deserialize, Serialize};

use crate::task::Task;

pub const ERROR_PREFIX: &str = "Sorry, I encountered an error.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body sent to the assistant endpoint
#[derive(Debug, Serialize)]
pub struct AssistantRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub tasks: &'a [Task],
}

/// Message history for one conversation.
///
/// A turn borrows the conversation mutably for its whole duration, so at
/// most one request is in flight per conversation.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Start a turn with the user's input. Blank input is ignored and
    /// returns `None`; otherwise returns the history to send.
    pub fn begin_turn(&mut self, input: &str) -> Option<Vec<ChatMessage>> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::user(input));
        Some(self.messages.clone())
    }

    /// Append a streamed fragment to the trailing assistant message,
    /// creating it on the first fragment of a turn.
    pub fn append_fragment(&mut self, fragment: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => last.content.push_str(fragment),
            _ => self.messages.push(ChatMessage::assistant(fragment)),
        }
    }

    /// Record a failed turn as an assistant message.
    pub fn fail(&mut self, detail: &str) -> String {
        let message = format!("{ERROR_PREFIX} {detail}");
        self.messages.push(ChatMessage::assistant(message.clone()));
        message
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
