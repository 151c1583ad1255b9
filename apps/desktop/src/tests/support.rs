use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use client_core::{AnswerService, AskError, ChatSession};
use shared::domain::Endpoint;

/// Answers every question with the same text after a short delay.
pub struct CannedService {
    pub answer: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl AnswerService for CannedService {
    async fn ask(&self, _endpoint: Endpoint, _question: &str) -> Result<String, AskError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.answer.to_string())
    }
}

pub fn canned_session(answer: &'static str) -> ChatSession {
    ChatSession::with_service(Arc::new(CannedService {
        answer,
        delay: Duration::from_millis(50),
    }))
}
