//! Plain-text presentation of the conversation.

use std::io::{self, Write};

use client_core::{ConversationState, QuickAction};
use shared::domain::{Message, Sender};

pub const GREETING: &str = "What Can We Help With?";
pub const TYPING: &str = "Typing...";

pub fn greeting(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{GREETING}")?;
    menu(out)
}

pub fn menu(out: &mut impl Write) -> io::Result<()> {
    for row in QuickAction::ALL.chunks(4) {
        let labels: Vec<_> = row.iter().map(|action| format!("[{action}]")).collect();
        writeln!(out, "  {}", labels.join(" "))?;
    }
    writeln!(
        out,
        "Type a question, /<topic> for a topic, /ask <rag|duo|ai> <question>, or /quit."
    )
}

pub fn message(out: &mut impl Write, message: &Message) -> io::Result<()> {
    let prefix = match message.sender() {
        Sender::User => "you",
        Sender::Assistant => "help",
    };
    let mut lines = message.text().lines();
    writeln!(out, "{prefix}> {}", lines.next().unwrap_or_default())?;
    for line in lines {
        writeln!(out, "{:width$}  {line}", "", width = prefix.len())?;
    }
    Ok(())
}

/// Prints messages appended since `shown` and returns the new count of shown messages.
pub fn new_messages(
    out: &mut impl Write,
    state: &ConversationState,
    shown: usize,
) -> io::Result<usize> {
    let messages = state.messages();
    for entry in messages.iter().skip(shown) {
        message(out, entry)?;
    }
    if state.is_pending() && messages.len() > shown {
        writeln!(out, "{TYPING}")?;
    }
    Ok(messages.len())
}
