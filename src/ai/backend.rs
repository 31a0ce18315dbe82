//! Core trait over hosted generative models

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

/// Error types for model calls
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No credential was configured
    #[error("API key is not configured")]
    MissingApiKey,

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the service
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// The service answered without any text
    #[error("response contained no text")]
    EmptyResponse,

    /// Response text was not the JSON we asked for
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One piece of request content
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Binary document, base64 encoded
    InlineData { mime_type: String, data: String },
}

/// A single-turn generation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub parts: Vec<Part>,
    /// When set, the model is asked for JSON matching this schema
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    /// Request with a single text prompt
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(prompt.into())],
            response_schema: None,
        }
    }

    /// Prepend a binary document ahead of the text parts
    pub fn with_document(mut self, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        self.parts.insert(
            0,
            Part::InlineData {
                mime_type: mime_type.into(),
                data: BASE64.encode(bytes),
            },
        );
        self
    }

    /// Ask for structured JSON output
    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Concatenated text parts, mostly useful for inspection
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A hosted model that turns a request into response text
///
/// One request, one response: implementations do not retry, stream, or
/// sequence concurrent calls.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier, for logging
    fn model_name(&self) -> &str;

    /// Run one generation and return the response text
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError>;
}
