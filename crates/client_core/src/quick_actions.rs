//! Topic buttons shown on the greeting menu.

use std::fmt;

use shared::domain::Endpoint;

pub const DUO_BYPASS_QUERY: &str = "I am getting bypass code on my screen when I try to login?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickAction {
    Hardware,
    Software,
    Duo,
    Network,
    Tickets,
    Password,
    Classroom,
    More,
}

/// What pressing a button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    Submit {
        query: &'static str,
        endpoint: Endpoint,
    },
    /// Reserved topic without a backend yet.
    Placeholder,
}

impl QuickAction {
    /// Menu order, two rows of four.
    pub const ALL: [QuickAction; 8] = [
        QuickAction::Hardware,
        QuickAction::Software,
        QuickAction::Duo,
        QuickAction::Network,
        QuickAction::Tickets,
        QuickAction::Password,
        QuickAction::Classroom,
        QuickAction::More,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QuickAction::Hardware => "HARDWARE",
            QuickAction::Software => "SOFTWARE",
            QuickAction::Duo => "DUO",
            QuickAction::Network => "NETWORK",
            QuickAction::Tickets => "TICKETS",
            QuickAction::Password => "PASSWORD",
            QuickAction::Classroom => "CLASSROOM",
            QuickAction::More => "MORE",
        }
    }

    pub fn effect(self) -> ActionEffect {
        match self {
            QuickAction::Duo => ActionEffect::Submit {
                query: DUO_BYPASS_QUERY,
                endpoint: Endpoint::Duo,
            },
            QuickAction::Hardware
            | QuickAction::Software
            | QuickAction::Network
            | QuickAction::Tickets
            | QuickAction::Password
            | QuickAction::Classroom
            | QuickAction::More => ActionEffect::Placeholder,
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
