//! Generative Language API backend over HTTP

use crate::agent::{GenerationError, GeneratorConfig, TextGenerator};
use crate::core::config::ConfigurationError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connect timeout, independent of the per-request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// First backoff between retries; doubles on each further retry
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound on a single backoff
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// HTTP client for the `generateContent` endpoint
///
/// Owns its retry policy: server errors and network failures are retried
/// up to `max_retries` times, client errors never are.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
    initial_backoff: Duration,
}

impl GeminiClient {
    /// Create a client; a missing key is reported by `preflight`, not here
    pub fn new(api_key: Option<String>, config: GeneratorConfig) -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ConfigurationError::Invalid(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config
                .endpoint
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: config.model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    #[cfg(test)]
    fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Endpoint URL for the configured model
    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::Auth("API key is not configured".to_string()))?;

        let body = Self::request_body(prompt);
        let timeout = Duration::from_secs(self.timeout_secs);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(
                model = %self.model,
                attempt,
                prompt_len = prompt.len(),
                "Sending generateContent request"
            );

            let result = self
                .client
                .post(self.url())
                .header("x-goog-api-key", api_key)
                .timeout(timeout)
                .json(&body)
                .send()
                .await;

            let retryable = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response.text().await.map_err(|e| {
                            GenerationError::Transport(format!("Failed to read response: {}", e))
                        })?;
                        return parse_response(&text);
                    }

                    let detail = response.text().await.unwrap_or_default();
                    let error = map_status(status, &detail);
                    if !status.is_server_error() {
                        return Err(error);
                    }
                    error
                }
                Err(e) if e.is_timeout() => {
                    return Err(GenerationError::Timeout(self.timeout_secs));
                }
                Err(e) => GenerationError::Transport(e.to_string()),
            };

            if attempt > self.max_retries {
                return Err(retryable);
            }

            warn!(attempt, error = %retryable, "Generation request failed, will retry");
            tokio::time::sleep(backoff_delay(self.initial_backoff, attempt)).await;
        }
    }

    fn preflight(&self) -> Result<(), ConfigurationError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::MissingCredential),
        }
    }
}

/// Delay before retry number `attempt` (1-based), capped at `MAX_BACKOFF`
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| initial.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Map a non-success status to an error, keeping the API's own message
fn map_status(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let detail = if message.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, message)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::Quota(detail),
        _ => GenerationError::Api(detail),
    }
}

/// Extract the generated text from a `generateContent` response body
fn parse_response(body: &str) -> Result<String, GenerationError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Api(format!("Malformed response: {}", e)))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GenerationError::Api(format!("Prompt blocked: {}", reason)));
    }

    let text: String = response
        .candidates
        .iter()
        .take(1)
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
