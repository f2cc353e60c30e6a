//! In-memory session store.

use synapse_common::{MessageId, SessionError, SessionId, SynapseError};
use tracing::{debug, info};

use crate::Role;

use super::types::{truncate_chars, Message, Session, SessionExport, SessionSummary, TITLE_MAX_CHARS};

/// Owns all sessions and the active-session pointer.
///
/// Every method is one self-contained mutation, so wrapping the store in
/// a mutex makes each call a single critical section.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// Sessions in creation order.
    sessions: Vec<Session>,
    active: Option<SessionId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding one fresh, active session.
    pub fn with_initial_session() -> Self {
        let mut store = Self::new();
        store.create_session();
        store
    }

    /// Allocate an empty session and make it active.
    pub fn create_session(&mut self) -> SessionId {
        let session = Session::new();
        let id = session.id.clone();
        self.sessions.push(session);
        self.active = Some(id.clone());
        info!(session = %id, "created session");
        id
    }

    pub fn get(&self, id: &SessionId) -> Result<&Session, SessionError> {
        self.sessions
            .iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    fn get_mut(&mut self, id: &SessionId) -> Result<&mut Session, SessionError> {
        self.sessions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Result<&Session, SessionError> {
        let id = self.active.as_ref().ok_or(SessionError::NoActiveSession)?;
        self.get(id)
    }

    pub fn set_active(&mut self, id: &SessionId) -> Result<(), SessionError> {
        self.get(id)?;
        self.active = Some(id.clone());
        debug!(session = %id, "switched active session");
        Ok(())
    }

    /// Append a message with a fresh id and timestamp.
    ///
    /// The first user message of a never-titled session also sets the
    /// title to its first 60 characters.
    pub fn append_message(
        &mut self,
        id: &SessionId,
        role: Role,
        content: impl Into<String>,
    ) -> Result<Message, SessionError> {
        let session = self.get_mut(id)?;
        let message = Message::new(role, content);

        if role == Role::User && session.has_placeholder_title() {
            session.title = truncate_chars(&message.content, TITLE_MAX_CHARS);
            // An empty first message leaves the next one to title the session.
            session.titled = !session.title.is_empty();
            debug!(session = %id, title = %session.title, "session titled");
        }

        session.messages.push(message.clone());
        Ok(message)
    }

    /// Remove exactly the message with `message_id`, wherever it sits.
    pub fn remove_message(
        &mut self,
        id: &SessionId,
        message_id: MessageId,
    ) -> Result<Option<Message>, SessionError> {
        let session = self.get_mut(id)?;
        let removed = session
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .map(|idx| session.messages.remove(idx));
        Ok(removed)
    }

    /// Empty the transcript, keeping id and title.
    pub fn clear_messages(&mut self, id: &SessionId) -> Result<(), SessionError> {
        let session = self.get_mut(id)?;
        session.messages.clear();
        info!(session = %id, "cleared session");
        Ok(())
    }

    /// Set a custom title. Later user messages leave it alone.
    pub fn rename_session(
        &mut self,
        id: &SessionId,
        title: impl Into<String>,
    ) -> Result<(), SessionError> {
        let session = self.get_mut(id)?;
        session.title = title.into();
        session.titled = true;
        Ok(())
    }

    /// Summaries, most recently created first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.iter().rev().map(Session::summary).collect()
    }

    /// Pretty-printed `{id, title, messages}` JSON for a session.
    pub fn export(&self, id: &SessionId) -> Result<String, SynapseError> {
        let session = self.get(id)?;
        Ok(serde_json::to_string_pretty(&SessionExport::from(session))?)
    }

    pub fn export_active(&self) -> Result<String, SynapseError> {
        let session = self.active()?;
        Ok(serde_json::to_string_pretty(&SessionExport::from(session))?)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
