//! Mock model for testing

use async_trait::async_trait;
use std::sync::Mutex;

use super::backend::{AiError, GenerateRequest, GenerativeModel};

/// Mock model returning a canned response and recording requests
pub struct MockModel {
    response: Option<String>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockModel {
    /// Mock that answers every request with `response`
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Mock whose every call fails as if the service rejected it
    pub fn failing() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(AiError::Server {
                status: 401,
                body: "API key not valid".to_string(),
            }),
        }
    }
}
