use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body posted to every answering endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

/// Successful reply body. `answer` is optional because the service is not strict about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AskResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl AskResponse {
    /// Extracts `answer` from an arbitrary JSON document. Anything other than a string is `None`.
    pub fn from_value(value: &Value) -> Self {
        Self {
            answer: value
                .get("answer")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Error body the service attaches to non-OK responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    pub error: String,
}
