//! Append-only message log shown to the user.

use shared::domain::Message;
use tokio::sync::watch;

/// Ordered message log. Appending is the only mutation; every append bumps a length signal
/// that views watch to scroll to the newest entry.
pub struct Transcript {
    messages: Vec<Message>,
    len_tx: watch::Sender<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            messages: Vec::new(),
            len_tx,
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.len_tx.send_replace(self.messages.len());
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Receiver that observes the transcript length after every append.
    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
