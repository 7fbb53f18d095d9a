// =============================================================================
// Gemini REST client — generateContent
// =============================================================================
//
// SECURITY: The API key is sent as the `x-goog-api-key` header and is never
// logged or serialized.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::AnalysisError;

/// Sampling and endpoint settings for [`GeminiClient`]. Missing fields in a
/// config file take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub top_p: f64,
    pub timeout_secs: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            timeout_secs: 30,
        }
    }
}

// -----------------------------------------------------------------------------
// Wire types
// -----------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
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

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }
}

// -----------------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------------

/// Client for the hosted text-generation endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client for `api_key` with the given settings.
    pub fn new(api_key: impl Into<String>, settings: GeminiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        debug!(model = %settings.model, base_url = %settings.base_url, "GeminiClient initialised");

        Ok(Self {
            api_key: api_key.into(),
            settings,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    /// POST generateContent and return the trimmed response text.
    #[instrument(skip(self, prompt), fields(model = %self.settings.model), name = "gemini::generate")]
    pub async fn generate(&self, prompt: &str) -> Result<String, AnalysisError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
            },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Api { status, body });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        let text = parsed
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AnalysisError::EmptyResponse)?;

        debug!(chars = text.len(), "analysis text received");
        Ok(text)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("settings", &self.settings)
            .finish()
    }
}
