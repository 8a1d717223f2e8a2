//! Text-generation backend for the review stages.
//!
//! The [`Generator`] trait decouples stage logic from the actual service
//! (currently the Gemini `generateContent` HTTP API). Tests use scripted
//! generators that return predetermined text without touching the network.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::core::state::Role;

/// One opaque generation call on behalf of a stage.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Stage the output will be attributed to.
    pub role: Role,
    /// Fully rendered prompt text.
    pub prompt: String,
}

/// Abstraction over text-generation backends.
pub trait Generator {
    /// Produce the text for the given request, or fail if the backend is
    /// unavailable. Retry policy is owned by the orchestrator, not here.
    fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

/// Generator backed by the Gemini `generateContent` endpoint.
pub struct HttpGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpGenerator {
    /// Build a client with a per-call timeout. A timed-out call surfaces as
    /// an ordinary transport error, identical to any other unavailability.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl Generator for HttpGenerator {
    #[instrument(skip_all, fields(role = %request.role, model = %self.model))]
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }]
        });

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .context("send generate request")?;

        let status = response.status();
        let body = response.text().context("read generate response body")?;
        if !status.is_success() {
            warn!(status = %status, "generate request failed");
            return Err(anyhow!(
                "generation backend returned {status}: {}",
                truncate_for_error(&body)
            ));
        }

        let text = parse_generate_response(&body)?;
        debug!(chars = text.len(), "generate request completed");
        Ok(text)
    }
}

/// Extract the first candidate's text from a `generateContent` response body.
pub fn parse_generate_response(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).context("parse generate response json")?;
    let text = value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("generate response has no candidate text"))?;
    if text.trim().is_empty() {
        return Err(anyhow!("generate response candidate text is empty"));
    }
    Ok(text.to_string())
}

fn truncate_for_error(body: &str) -> &str {
    let limit = 200;
    match body.char_indices().nth(limit) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
