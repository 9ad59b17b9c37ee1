//! Core `LanguageModel` trait and the HTTP-backed `ApiModel`.
//!
//! `ApiModel` speaks either the Gemini `generateContent` API or any
//! OpenAI-compatible `/v1/chat/completions` endpoint.  All connection details
//! come from [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::config::{LlmConfig, LlmProvider};

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while asking the model for text.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The client cannot issue requests at all (e.g. no API key).
    #[error("language model not configured: {0}")]
    NotConfigured(String),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("language model request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse model response: {0}")]
    Parse(String),

    /// The model returned no usable text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The model answered but the text did not have the requested shape.
    #[error("malformed model output: {0}")]
    Malformed(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Configuration problems and rejected credentials fail identically on
    /// every attempt, so they are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::NotConfigured(_) => false,
            LlmError::Status { status, .. } => !matches!(status, 400 | 401 | 403 | 404),
            _ => true,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationParams
// ---------------------------------------------------------------------------

/// Sampling parameters sent with one prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Settings for sentence generation: some variety, short answers.
    pub const SENTENCE: GenerationParams = GenerationParams {
        temperature: 0.7,
        top_k: Some(40),
        top_p: Some(0.9),
        max_output_tokens: 200,
    };

    /// Settings for answer evaluation: near-deterministic, room for JSON.
    pub const EVALUATION: GenerationParams = GenerationParams {
        temperature: 0.3,
        top_k: None,
        top_p: None,
        max_output_tokens: 1_000,
    };
}

// ---------------------------------------------------------------------------
// LanguageModel trait
// ---------------------------------------------------------------------------

/// Async trait for free-text-in, free-text-out model calls.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// behind an `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiModel
// ---------------------------------------------------------------------------

/// Safety categories blocked at medium probability and above.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// HTTP client for the configured provider.
pub struct ApiModel {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ApiModel {
    /// Build an `ApiModel` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    async fn generate_gemini(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let key = self
            .api_key()
            .ok_or_else(|| LlmError::NotConfigured("Gemini API key is not set".into()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let mut generation_config = json!({
            "temperature":     params.temperature,
            "maxOutputTokens": params.max_output_tokens,
        });
        if let Some(k) = params.top_k {
            generation_config["topK"] = json!(k);
        }
        if let Some(p) = params.top_p {
            generation_config["topP"] = json!(p);
        }

        let safety: Vec<_> = SAFETY_CATEGORIES
            .iter()
            .map(|c| json!({ "category": c, "threshold": "BLOCK_MEDIUM_AND_ABOVE" }))
            .collect();

        let body = json!({
            "contents": [ { "role": "user", "parts": [ { "text": prompt } ] } ],
            "generationConfig": generation_config,
            "safetySettings": safety,
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let json = read_json(response).await?;
        gemini_text(&json)
    }

    async fn generate_openai(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut body = json!({
            "model":       self.config.model,
            "messages":    [ { "role": "user", "content": prompt } ],
            "stream":      false,
            "temperature": params.temperature,
            "max_tokens":  params.max_output_tokens,
        });
        if let Some(p) = params.top_p {
            body["top_p"] = json!(p);
        }

        let mut req = self.client.post(&url).json(&body);

        // Local providers need no key; attach it only when present.
        if let Some(key) = self.api_key() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let json = read_json(response).await?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for ApiModel {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        log::debug!(
            "llm: {:?} request ({} chars, temperature {})",
            self.config.provider,
            prompt.chars().count(),
            params.temperature
        );
        match self.config.provider {
            LlmProvider::Gemini => self.generate_gemini(prompt, params).await,
            LlmProvider::OpenAiCompatible => self.generate_openai(prompt, params).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: text.chars().take(300).collect(),
        });
    }

    serde_json::from_str(&text).map_err(|e| LlmError::Parse(e.to_string()))
}

/// Concatenate the text parts of the first Gemini candidate.
fn gemini_text(json: &serde_json::Value) -> Result<String, LlmError> {
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or(LlmError::EmptyResponse)?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
