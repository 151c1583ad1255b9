//! Draft text and the greeting/conversing switch.

/// Keyboard input relevant to the draft. Only `Enter` commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
}

#[derive(Debug, Default, Clone)]
pub struct InputSession {
    draft: String,
    started: bool,
}

impl InputSession {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Replaces the draft verbatim; no validation happens while typing.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Applies a non-commit key to the draft. Returns `true` when the key is the commit key and
    /// the caller should submit the draft instead.
    pub fn edit(&mut self, key: &Key) -> bool {
        match key {
            Key::Char(ch) => {
                self.draft.push(*ch);
                false
            }
            Key::Backspace => {
                self.draft.pop();
                false
            }
            Key::Enter => true,
        }
    }

    pub(crate) fn clear_draft(&mut self) {
        self.draft.clear();
    }

    /// Marks the conversation as started. Returns `true` only for the first call.
    pub(crate) fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }
}
