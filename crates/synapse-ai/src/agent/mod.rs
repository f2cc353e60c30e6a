//! The conversational agent.
//!
//! An [`Agent`] owns the session store, the chat backend, the tool
//! registry and the live settings. [`Agent::send`] runs one turn: record
//! the user's message, show a `Thinking...` placeholder, ask the model
//! once, replace the placeholder with the reply (running any requested
//! tools in order), and go back to idle. Only one turn runs at a time;
//! a second `send` while one is in flight is dropped.

mod guard;
mod turn;


use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use synapse_common::SessionId;
use synapse_config::Settings;

use crate::session::{Message, SessionStore};
use crate::token_tracker::TokenTracker;
use crate::tools::ToolRegistry;
use crate::{AiClient, TokenUsage};

/// Transient assistant message shown while waiting for the model.
pub const THINKING_PLACEHOLDER: &str = "Thinking...";
/// Appended when the model returns neither text nor tool calls.
pub const NO_RESPONSE: &str = "No response from model.";
/// Announcement used when a tool-calling reply has no text of its own.
pub const USING_TOOLS: &str = "Using tools...";

/// Where a turn is. Exposed for status display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingReply,
    InterpretingReply,
    ExecutingTools,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingReply => "awaiting reply",
            TurnState::InterpretingReply => "interpreting reply",
            TurnState::ExecutingTools => "executing tools",
        };
        f.write_str(s)
    }
}

/// What [`Agent::send`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(TurnReport),
    /// Another turn was in flight; nothing happened.
    Busy,
    /// The input was blank; nothing happened.
    EmptyInput,
}

/// Summary of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub session: SessionId,
    /// Assistant messages appended by this turn, in order.
    pub messages: Vec<Message>,
    pub tool_calls: usize,
    pub usage: TokenUsage,
}

pub struct Agent {
    store: Mutex<SessionStore>,
    client: Arc<dyn AiClient>,
    tools: ToolRegistry,
    settings: Arc<Settings>,
    busy: AtomicBool,
    state: Mutex<TurnState>,
    tracker: Mutex<TokenTracker>,
}

impl Agent {
    /// An agent with the built-in tools and one empty, active session.
    pub fn new(client: Arc<dyn AiClient>, settings: Arc<Settings>) -> Self {
        Self {
            store: Mutex::new(SessionStore::with_initial_session()),
            client,
            tools: ToolRegistry::with_builtins(),
            settings,
            busy: AtomicBool::new(false),
            state: Mutex::new(TurnState::Idle),
            tracker: Mutex::new(TokenTracker::new()),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Mutex::new(store);
        self
    }

    /// Run `f` with exclusive access to the session store.
    pub fn with_sessions<R>(&self, f: impl FnOnce(&mut SessionStore) -> R) -> R {
        f(&mut lock(&self.store))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn state(&self) -> TurnState {
        *lock(&self.state)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Snapshot of token usage so far.
    pub fn usage(&self) -> TokenTracker {
        lock(&self.tracker).clone()
    }

    pub fn reset_usage(&self) {
        lock(&self.tracker).reset();
    }

    fn set_state(&self, state: TurnState) {
        *lock(&self.state) = state;
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
