//! Session and message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synapse_common::{MessageId, SessionId};

use crate::{ChatMessage, Role};

/// Title of a session that has not seen a user message yet.
pub const PLACEHOLDER_TITLE: &str = "New chat";
/// Titles are cut to this many characters of the first user message.
pub const TITLE_MAX_CHARS: usize = 60;
/// Previews are cut to this many characters of the last message.
pub const PREVIEW_MAX_CHARS: usize = 80;
/// Preview shown for a session without messages.
pub const EMPTY_PREVIEW: &str = "No messages yet";

/// One entry in a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        ChatMessage::new(msg.role, msg.content.clone())
    }
}

/// A conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub(super) id: SessionId,
    pub(super) title: String,
    /// Set by the first user message or a rename; the title is final after.
    pub(super) titled: bool,
    pub(super) messages: Vec<Message>,
    pub(super) created_at: DateTime<Utc>,
}

impl Session {
    pub(super) fn new() -> Self {
        Self {
            id: SessionId::new(),
            title: PLACEHOLDER_TITLE.to_string(),
            titled: false,
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True until the first user message (or a rename) sets a title,
    /// whatever text that title happens to be.
    pub fn has_placeholder_title(&self) -> bool {
        !self.titled
    }

    /// History in wire form, for a provider request.
    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(ChatMessage::from).collect()
    }

    pub fn summary(&self) -> SessionSummary {
        let preview = match self.last_message() {
            Some(msg) => truncate_chars(&msg.content, PREVIEW_MAX_CHARS),
            None => EMPTY_PREVIEW.to_string(),
        };
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            message_count: self.messages.len(),
            preview,
        }
    }
}

/// Listing entry for a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub message_count: usize,
    pub preview: String,
}

/// Export document: `{id, title, messages}`.
#[derive(Serialize)]
pub(super) struct SessionExport<'a> {
    pub id: &'a SessionId,
    pub title: &'a str,
    pub messages: &'a [Message],
}

impl<'a> From<&'a Session> for SessionExport<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            id: &session.id,
            title: &session.title,
            messages: &session.messages,
        }
    }
}

/// First `max` characters of `s` (characters, not bytes).
pub(super) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
