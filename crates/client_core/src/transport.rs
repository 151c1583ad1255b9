//! Outbound calls to the answering service.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    domain::Endpoint,
    protocol::{AskRequest, AskResponse, ServiceErrorBody},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AskError, ServiceSetupError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Something that can answer a single, context-free question.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, endpoint: Endpoint, question: &str) -> Result<String, AskError>;
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: Url,
    pub paths: HashMap<Endpoint, String>,
    pub request_timeout: Duration,
    /// Reject 2xx replies without a string `answer` instead of showing an empty reply.
    pub strict_decoding: bool,
}

impl ServiceConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            paths: Endpoint::ALL
                .into_iter()
                .map(|endpoint| (endpoint, endpoint.default_path().to_string()))
                .collect(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            strict_decoding: false,
        }
    }

    fn path(&self, endpoint: Endpoint) -> &str {
        self.paths
            .get(&endpoint)
            .map(String::as_str)
            .unwrap_or_else(|| endpoint.default_path())
    }

    /// Resolves an endpoint path below `base_url`, keeping any path prefix the base carries.
    pub fn route(&self, endpoint: Endpoint) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let prefix = format!("{}/", base.path());
            base.set_path(&prefix);
        }
        base.join(self.path(endpoint).trim_start_matches('/'))
    }
}

pub struct HttpAnswerService {
    http: Client,
    routes: HashMap<Endpoint, Url>,
    request_timeout: Duration,
    strict_decoding: bool,
}

impl HttpAnswerService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceSetupError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let mut routes = HashMap::new();
        for endpoint in Endpoint::ALL {
            let url = config
                .route(endpoint)
                .map_err(|source| ServiceSetupError::InvalidRoute {
                    endpoint,
                    path: config.path(endpoint).to_string(),
                    source,
                })?;
            routes.insert(endpoint, url);
        }

        Ok(Self {
            http,
            routes,
            request_timeout: config.request_timeout,
            strict_decoding: config.strict_decoding,
        })
    }

    pub fn route(&self, endpoint: Endpoint) -> &Url {
        &self.routes[&endpoint]
    }

    fn transport_error(&self, endpoint: Endpoint, source: reqwest::Error) -> AskError {
        if source.is_timeout() {
            AskError::Timeout {
                endpoint,
                timeout: self.request_timeout,
            }
        } else {
            AskError::Transport { endpoint, source }
        }
    }

    fn decode_answer(&self, endpoint: Endpoint, body: &[u8]) -> Result<String, AskError> {
        let value = match serde_json::from_slice::<Value>(body) {
            Ok(value) => value,
            Err(err) if self.strict_decoding => {
                return Err(AskError::MalformedResponse {
                    endpoint,
                    reason: format!("body is not JSON: {err}"),
                });
            }
            Err(err) => {
                warn!(%endpoint, %err, "answer body is not JSON; showing empty reply");
                return Ok(String::new());
            }
        };

        match AskResponse::from_value(&value).answer {
            Some(answer) => Ok(answer),
            None if self.strict_decoding => Err(AskError::MalformedResponse {
                endpoint,
                reason: "missing string field 'answer'".to_string(),
            }),
            None => {
                warn!(%endpoint, "answer field missing; showing empty reply");
                Ok(String::new())
            }
        }
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn ask(&self, endpoint: Endpoint, question: &str) -> Result<String, AskError> {
        let url = self.route(endpoint).clone();
        debug!(%endpoint, %url, "posting question");

        let response = self
            .http
            .post(url)
            .json(&AskRequest::new(question))
            .send()
            .await
            .map_err(|source| self.transport_error(endpoint, source))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ServiceErrorBody>()
                .await
                .ok()
                .map(|body| body.error);
            return Err(AskError::Status {
                endpoint,
                status: status.as_u16(),
                detail,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| self.transport_error(endpoint, source))?;
        self.decode_answer(endpoint, &body)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
