//! One user-message-to-reply cycle.

use synapse_common::{new_correlation_id, SessionError, SessionId};
use tracing::{debug, info, info_span, Instrument};

use crate::session::Message;
use crate::Role;

use super::guard::{BusyGuard, PlaceholderGuard};
use super::{
    lock, Agent, TurnOutcome, TurnReport, TurnState, NO_RESPONSE, THINKING_PLACEHOLDER,
    USING_TOOLS,
};

impl Agent {
    /// Send `text` as the user and run one turn on the active session.
    ///
    /// Provider and tool failures end up as assistant messages; the only
    /// errors returned are session-store misuse.
    pub async fn send(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(TurnOutcome::EmptyInput);
        }

        let Some(_guard) = BusyGuard::acquire(&self.busy, &self.state) else {
            debug!("turn already in flight, dropping input");
            return Ok(TurnOutcome::Busy);
        };

        let turn_id = new_correlation_id();
        self.run_turn(text)
            .instrument(info_span!("turn", turn = %turn_id))
            .await
            .map(TurnOutcome::Completed)
    }

    async fn run_turn(&self, text: &str) -> Result<TurnReport, SessionError> {
        let (session, history, placeholder) = {
            let mut store = lock(&self.store);
            let session = store
                .active_id()
                .cloned()
                .ok_or(SessionError::NoActiveSession)?;
            store.append_message(&session, Role::User, text)?;
            let history = store.get(&session)?.chat_messages();
            let placeholder =
                store.append_message(&session, Role::Assistant, THINKING_PLACEHOLDER)?;
            (session, history, placeholder.id)
        };
        let placeholder = PlaceholderGuard::new(&self.store, session.clone(), placeholder);
        info!(session = %session, history = history.len(), "turn started");

        self.set_state(TurnState::AwaitingReply);
        let config = self.settings.provider();
        let reply = self.client.complete(&history, &config).await;

        self.set_state(TurnState::InterpretingReply);
        placeholder.remove()?;
        if config.has_api_key() {
            lock(&self.tracker).record(config.provider.as_str(), &session, &reply.usage);
        }

        let mut appended = Vec::new();
        if reply.is_empty() {
            appended.push(self.append_reply(&session, NO_RESPONSE)?);
        } else if reply.tool_calls.is_empty() {
            appended.push(self.append_reply(&session, reply.content.as_str())?);
        } else {
            let announcement = if reply.content.trim().is_empty() {
                USING_TOOLS
            } else {
                reply.content.as_str()
            };
            appended.push(self.append_reply(&session, announcement)?);

            self.set_state(TurnState::ExecutingTools);
            for call in &reply.tool_calls {
                let result = self.tools.dispatch(call).await;
                let line = format!("Tool result ({}): {}", call.name, result.render());
                appended.push(self.append_reply(&session, line)?);
            }
        }

        info!(
            session = %session,
            appended = appended.len(),
            tool_calls = reply.tool_calls.len(),
            "turn completed"
        );

        Ok(TurnReport {
            session,
            messages: appended,
            tool_calls: reply.tool_calls.len(),
            usage: reply.usage,
        })
    }

    fn append_reply(
        &self,
        session: &SessionId,
        content: impl Into<String>,
    ) -> Result<Message, SessionError> {
        lock(&self.store).append_message(session, Role::Assistant, content)
    }
}
