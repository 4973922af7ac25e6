//! Ollama local generation backend.
//!
//! Implements [`GenerationBackend`] against the Ollama `/api/generate`
//! endpoint. Timeouts are handled internally: one retry after a short
//! fixed backoff, then a sentinel answer string: a slow model degrades
//! the episode but never crashes the run. Every other failure propagates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use leakscope_types::config::HarnessConfig;
use leakscope_types::errors::LeakscopeError;
use leakscope_types::records::GenerationRequest;
use leakscope_types::traits::GenerationBackend;

/// Sentinel answer returned when both generation attempts time out.
pub const TIMEOUT_SENTINEL: &str =
    "[ERROR] generation backend timed out twice; the model did not return a response.";

/// Environment override for the request timeout, in seconds.
pub const TIMEOUT_ENV_VAR: &str = "LEAKSCOPE_TIMEOUT_S";

/// Pause between the first timed-out attempt and the retry.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Ollama generation backend for local model execution.
pub struct OllamaBackend {
    client: Client,
    api_base: String,
    retry_backoff: Duration,
}

// -- Ollama API request/response types --

/// Request body for Ollama's `/api/generate` endpoint.
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    options: OllamaOptions,
    /// Disable streaming to get a single response object.
    stream: bool,
}

/// Generation options for Ollama.
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

/// Response from Ollama's `/api/generate` endpoint (non-streaming).
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaBackend {
    /// Create a backend with an explicit base URL and request timeout.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, LeakscopeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LeakscopeError::Backend(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    /// Create a backend from harness config.
    ///
    /// The `LEAKSCOPE_TIMEOUT_S` environment variable overrides the
    /// configured timeout, so a slow model can be accommodated without
    /// editing the config file.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, LeakscopeError> {
        let timeout_secs = std::env::var(TIMEOUT_ENV_VAR)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(config.request_timeout_secs);
        Self::new(&config.ollama_base_url, Duration::from_secs(timeout_secs))
    }

    /// Override the retry backoff. Intended for tests.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    /// Send a generation request, retrying once on timeout.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LeakscopeError> {
        let url = format!("{}/api/generate", self.api_base);
        let body = OllamaGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            options: OllamaOptions {
                temperature: request.temperature,
            },
            stream: false,
        };

        for attempt in 0..2u32 {
            let response = match self.client.post(&url).json(&body).send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    warn!(attempt, error = %e, "Ollama generation request timed out");
                    if attempt == 0 {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                    continue;
                }
                Err(e) => {
                    return Err(LeakscopeError::Backend(format!(
                        "Ollama HTTP request failed: {e}"
                    )));
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                return Err(LeakscopeError::Backend(format!(
                    "Ollama API error (HTTP {status}): {body_text}"
                )));
            }

            match response.json::<OllamaGenerateResponse>().await {
                Ok(parsed) => return Ok(parsed.response),
                // The body read can also hit the client timeout.
                Err(e) if e.is_timeout() => {
                    warn!(attempt, error = %e, "Ollama response body read timed out");
                    if attempt == 0 {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
                Err(e) => {
                    return Err(LeakscopeError::Backend(format!(
                        "failed to parse Ollama response: {e}"
                    )));
                }
            }
        }

        warn!("both generation attempts timed out, substituting sentinel answer");
        Ok(TIMEOUT_SENTINEL.to_string())
    }
}
