//! Gemini `generateContent` REST backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::backend::{AiError, GenerateRequest, GenerativeModel, Part};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Client for the Gemini API
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client; without a key this only warns and calls fail later
    pub fn new(api_base: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            log::warn!("API_KEY environment variable not set. Gemini API calls will fail.");
        }

        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_body(request: GenerateRequest) -> WireRequest {
    let parts = request
        .parts
        .into_iter()
        .map(|part| match part {
            Part::Text(text) => WirePart::Text { text },
            Part::InlineData { mime_type, data } => WirePart::Inline {
                inline_data: InlineData { mime_type, data },
            },
        })
        .collect();

    WireRequest {
        contents: vec![WireContent { role: "user", parts }],
        generation_config: request.response_schema.map(|schema| GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        }),
    }
}

/// Text of the first candidate, all parts joined
fn response_text(response: WireResponse) -> Result<String, AiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;
        let url = self.generate_url();

        log::debug!("POST {} ({} parts)", url, request.parts.len());
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&build_body(request))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WireResponse = resp.json().await?;
        response_text(parsed)
    }
}
