//! The single conversation value owned by a running session.

use std::collections::BTreeSet;

use shared::domain::{Message, MessageId};
use tokio::sync::watch;

use crate::{input::InputSession, transcript::Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Greeting,
    Conversing,
}

#[derive(Default)]
pub struct ConversationState {
    input: InputSession,
    transcript: Transcript,
    in_flight: BTreeSet<MessageId>,
    last_id: u64,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &InputSession {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputSession {
        &mut self.input
    }

    pub fn draft(&self) -> &str {
        self.input.draft()
    }

    pub fn started(&self) -> bool {
        self.input.started()
    }

    pub fn phase(&self) -> Phase {
        if self.input.started() {
            Phase::Conversing
        } else {
            Phase::Greeting
        }
    }

    /// True while at least one request is awaiting its reply.
    pub fn is_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Ids of the user messages whose replies are still outstanding, oldest first.
    pub fn pending_requests(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.in_flight.iter().copied()
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.transcript.subscribe_len()
    }

    pub(crate) fn next_message_id(&mut self) -> MessageId {
        self.last_id += 1;
        MessageId(self.last_id)
    }

    pub(crate) fn append(&mut self, message: Message) {
        self.transcript.append(message);
    }

    pub(crate) fn mark_pending(&mut self, request_id: MessageId) {
        self.in_flight.insert(request_id);
    }

    pub(crate) fn clear_pending(&mut self, request_id: MessageId) -> bool {
        self.in_flight.remove(&request_id)
    }
}
