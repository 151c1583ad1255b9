use std::sync::Arc;

use shared::domain::{Endpoint, MessageId};
use tokio::sync::watch;
use tracing::debug;

pub mod controller;
pub mod error;
pub mod input;
pub mod quick_actions;
pub mod state;
pub mod transcript;
pub mod transport;

pub use controller::{Origin, RequestController, Settlement, APOLOGY_TEXT};
pub use error::{AskError, ServiceSetupError};
pub use input::{InputSession, Key};
pub use quick_actions::{ActionEffect, QuickAction};
pub use state::{ConversationState, Phase};
pub use transport::{AnswerService, HttpAnswerService, ServiceConfig};

/// One running conversation: the owned state plus the controller that mutates it.
///
/// Every method runs to completion before returning; the only waiting happens in
/// [`ChatSession::next_reply`], which folds one settled request into the transcript.
pub struct ChatSession {
    state: ConversationState,
    controller: RequestController,
}

impl ChatSession {
    pub fn new(controller: RequestController) -> Self {
        Self {
            state: ConversationState::new(),
            controller,
        }
    }

    pub fn with_service(service: Arc<dyn AnswerService>) -> Self {
        Self::new(RequestController::new(service))
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.state.subscribe_len()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.input_mut().set_draft(text);
    }

    /// Sends the current draft to the default endpoint.
    pub fn submit_draft(&mut self) -> Option<MessageId> {
        let draft = self.state.draft().to_string();
        self.controller
            .submit(&mut self.state, &draft, Endpoint::default(), Origin::Draft)
    }

    /// Edits the draft, or submits it when `key` is the commit key.
    pub fn handle_key(&mut self, key: Key) -> Option<MessageId> {
        if self.state.input_mut().edit(&key) {
            self.submit_draft()
        } else {
            None
        }
    }

    pub fn press(&mut self, action: QuickAction) -> Option<MessageId> {
        match action.effect() {
            ActionEffect::Submit { query, endpoint } => {
                self.controller
                    .submit(&mut self.state, query, endpoint, Origin::QuickAction)
            }
            ActionEffect::Placeholder => {
                debug!(%action, "topic has no backend yet");
                None
            }
        }
    }

    /// Sends `query` to a specific endpoint without going through the draft.
    pub fn ask(&mut self, endpoint: Endpoint, query: &str) -> Option<MessageId> {
        self.controller
            .submit(&mut self.state, query, endpoint, Origin::Command)
    }

    /// Waits for the next outstanding request to settle and appends its reply.
    ///
    /// Returns `None` immediately when nothing is pending.
    pub async fn next_reply(&mut self) -> Option<MessageId> {
        while self.state.is_pending() {
            let settlement = self.controller.next_settlement().await?;
            if let Some(reply_id) = self.controller.settle(&mut self.state, settlement) {
                return Some(reply_id);
            }
        }
        None
    }

    /// Drains every outstanding request.
    pub async fn settle_all(&mut self) {
        while self.next_reply().await.is_some() {}
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
