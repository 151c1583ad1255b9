use std::time::Duration;

use shared::domain::Endpoint;
use thiserror::Error;

/// Why an outbound question did not produce an answer.
///
/// None of these reach the transcript; the controller swaps them for a fixed apology and
/// only logs the details.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("request to {endpoint} endpoint failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} endpoint answered with status {status}{}", detail_suffix(.detail))]
    Status {
        endpoint: Endpoint,
        status: u16,
        detail: Option<String>,
    },
    #[error("{endpoint} endpoint did not answer within {timeout:?}")]
    Timeout { endpoint: Endpoint, timeout: Duration },
    #[error("{endpoint} endpoint returned an unusable payload: {reason}")]
    MalformedResponse { endpoint: Endpoint, reason: String },
    #[error("request task for {endpoint} endpoint ended without settling")]
    Abandoned { endpoint: Endpoint },
}

impl AskError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            AskError::Transport { endpoint, .. }
            | AskError::Status { endpoint, .. }
            | AskError::Timeout { endpoint, .. }
            | AskError::MalformedResponse { endpoint, .. }
            | AskError::Abandoned { endpoint } => *endpoint,
        }
    }
}

/// Problems building the HTTP answer service from configuration.
#[derive(Debug, Error)]
pub enum ServiceSetupError {
    #[error("invalid route '{path}' for {endpoint} endpoint: {source}")]
    InvalidRoute {
        endpoint: Endpoint,
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}
