//! Conversation sessions.
//!
//! The [`SessionStore`] owns every [`Session`] and the active-session
//! pointer. Sessions are created on demand and never destroyed; clearing
//! one empties its history but keeps its id and title.

mod store;
mod types;

#[cfg(test)]
mod tests;

pub use store::SessionStore;
pub use types::{
    Message, Session, SessionSummary, EMPTY_PREVIEW, PLACEHOLDER_TITLE, PREVIEW_MAX_CHARS,
    TITLE_MAX_CHARS,
};
