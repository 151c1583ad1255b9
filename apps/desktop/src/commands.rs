//! Terminal input lines mapped to session actions.

use client_core::QuickAction;
use shared::domain::Endpoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text typed into the draft and committed.
    Say(String),
    Press(QuickAction),
    Ask(Endpoint, String),
    Menu,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let Some(rest) = line.trim_start().strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim_start()),
            None => (rest.trim_end(), ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Command::Quit,
            "help" | "menu" => Command::Menu,
            "ask" => {
                let (endpoint, question) = args
                    .split_once(char::is_whitespace)
                    .unwrap_or((args, ""));
                match Endpoint::parse(endpoint) {
                    Some(endpoint) => Command::Ask(endpoint, question.to_string()),
                    None => Command::Unknown(line.trim().to_string()),
                }
            }
            other => match QuickAction::from_label(other) {
                Some(action) => Command::Press(action),
                None => Command::Unknown(line.trim().to_string()),
            },
        }
    }
}
