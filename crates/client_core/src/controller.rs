//! Request lifecycle: from an accepted query to exactly one assistant reply.

use std::{sync::Arc, time::Duration};

use shared::domain::{Endpoint, Message, MessageId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{error::AskError, state::ConversationState, transport::AnswerService};

pub const APOLOGY_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// Where a submitted query came from. Only the free-text draft is cleared on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Draft,
    QuickAction,
    Command,
}

/// Completion of one outbound request, waiting to be folded into the conversation.
#[derive(Debug)]
pub struct Settlement {
    request_id: MessageId,
    endpoint: Endpoint,
    outcome: Result<String, AskError>,
}

impl Settlement {
    pub fn request_id(&self) -> MessageId {
        self.request_id
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Sends exactly one settlement for its request, even if the request task is dropped early.
struct SettleGuard {
    request_id: MessageId,
    endpoint: Endpoint,
    tx: Option<mpsc::UnboundedSender<Settlement>>,
}

impl SettleGuard {
    fn settle(mut self, outcome: Result<String, AskError>) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: Result<String, AskError>) {
        if let Some(tx) = self.tx.take() {
            let settlement = Settlement {
                request_id: self.request_id,
                endpoint: self.endpoint,
                outcome,
            };
            if tx.send(settlement).is_err() {
                debug!(request_id = %self.request_id, "controller gone; dropping settlement");
            }
        }
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let endpoint = self.endpoint;
        self.send(Err(AskError::Abandoned { endpoint }));
    }
}

pub struct RequestController {
    service: Arc<dyn AnswerService>,
    timeout: Option<Duration>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    settled_rx: mpsc::UnboundedReceiver<Settlement>,
}

impl RequestController {
    pub fn new(service: Arc<dyn AnswerService>) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            service,
            timeout: None,
            settled_tx,
            settled_rx,
        }
    }

    /// Caps every request at `timeout` on top of whatever the transport enforces.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Accepts a query, records it and starts the outbound call on the current tokio runtime.
    ///
    /// Whitespace-only queries are ignored and return `None` without touching `state`.
    /// Otherwise the returned id names both the user message and the pending request.
    pub fn submit(
        &self,
        state: &mut ConversationState,
        query: &str,
        endpoint: Endpoint,
        origin: Origin,
    ) -> Option<MessageId> {
        if query.trim().is_empty() {
            debug!(?origin, "ignoring empty query");
            return None;
        }

        let request_id = state.next_message_id();
        state.append(Message::user(request_id, query));
        if state.input_mut().start() {
            info!("conversation started");
        }
        state.mark_pending(request_id);
        if origin == Origin::Draft {
            state.input_mut().clear_draft();
        }

        self.dispatch(request_id, endpoint, query.to_string());
        Some(request_id)
    }

    fn dispatch(&self, request_id: MessageId, endpoint: Endpoint, question: String) {
        let guard = SettleGuard {
            request_id,
            endpoint,
            tx: Some(self.settled_tx.clone()),
        };
        let service = Arc::clone(&self.service);
        let timeout = self.timeout;
        info!(%request_id, %endpoint, "question sent");

        tokio::spawn(async move {
            let call = service.ask(endpoint, &question);
            let outcome = match timeout {
                Some(timeout) => tokio::time::timeout(timeout, call)
                    .await
                    .unwrap_or_else(|_| Err(AskError::Timeout { endpoint, timeout })),
                None => call.await,
            };
            guard.settle(outcome);
        });
    }

    /// Waits for the next request to settle, in arrival order.
    ///
    /// Never resolves while nothing is in flight; check `ConversationState::is_pending` first.
    pub async fn next_settlement(&mut self) -> Option<Settlement> {
        self.settled_rx.recv().await
    }

    pub fn try_next_settlement(&mut self) -> Option<Settlement> {
        self.settled_rx.try_recv().ok()
    }

    /// Appends the assistant reply for a settled request and clears its pending mark in the
    /// same step. A settlement for a request `state` is not waiting on is dropped.
    pub fn settle(
        &self,
        state: &mut ConversationState,
        settlement: Settlement,
    ) -> Option<MessageId> {
        let Settlement {
            request_id,
            endpoint,
            outcome,
        } = settlement;

        if !state.pending_requests().any(|id| id == request_id) {
            warn!(%request_id, %endpoint, "settlement for unknown request ignored");
            return None;
        }

        let text = match outcome {
            Ok(answer) => {
                info!(%request_id, %endpoint, chars = answer.len(), "answer received");
                answer
            }
            Err(err) => {
                warn!(%request_id, %endpoint, error = %err, "question failed");
                APOLOGY_TEXT.to_string()
            }
        };

        let reply_id = state.next_message_id();
        state.append(Message::assistant(reply_id, text));
        state.clear_pending(request_id);
        Some(reply_id)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
