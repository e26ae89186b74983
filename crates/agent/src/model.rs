//! Direct answers from the Anthropic Messages API.

use std::sync::OnceLock;
use std::time::Duration;

use dispatch::{DispatchRequest, Responder, ResponderError, ToolRegistry};
use serde::{Deserialize, Serialize};

use crate::config::{AgentConfig, BackendConfig};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request to the Messages API.
#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [ApiMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Answers requests no tool matched with a single-turn model call.
///
/// Dispatch is synchronous, so this uses the blocking client. It is built on
/// first use, on the dispatch thread, and reused after that. A blocking
/// client must not be created or dropped on an async worker.
#[derive(Debug)]
pub struct ModelResponder {
    http: OnceLock<reqwest::blocking::Client>,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    system: String,
    timeout: Duration,
}

impl ModelResponder {
    pub fn new(
        api_key: impl Into<String>,
        backend: &BackendConfig,
        agent: &AgentConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            http: OnceLock::new(),
            endpoint: ANTHROPIC_API_URL.to_string(),
            api_key: api_key.into(),
            model: backend.model.clone(),
            max_tokens: backend.max_tokens,
            system: format!(
                "You are {}. {} Be concise and direct.",
                agent.name, agent.description
            ),
            timeout,
        }
    }

    /// Point at a different Messages-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, ResponderError> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ResponderError::Unavailable(e.to_string()))?;
        Ok(self.http.get_or_init(|| client))
    }

    fn body<'a>(&'a self, text: &'a str) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &self.system,
            messages: [ApiMessage {
                role: "user",
                content: text,
            }],
        }
    }
}

impl Responder for ModelResponder {
    fn respond(
        &self,
        request: &DispatchRequest,
        _registry: &ToolRegistry,
    ) -> Result<String, ResponderError> {
        let response = self
            .client()?
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&self.body(request.text.trim()))
            .send()
            .map_err(|e| ResponderError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ResponderError::Unavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(ResponderError::Api(format!("{status}: {body}")));
        }

        parse_reply(&body)
    }
}

fn parse_reply(body: &str) -> Result<String, ResponderError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| ResponderError::Api(e.to_string()))?;

    let text = response
        .content
        .into_iter()
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(ResponderError::Api("empty response".into()));
    }
    Ok(text)
}
