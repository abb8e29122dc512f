//! Shared chat client for the vision and text model endpoints. Both speak
//! the same Ollama-shaped `/api/chat` wire format; only the messages differ
//! (vision attaches `images`, text sets `options`).

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::error::{LlmError, Result};
use crate::types::{ChatRequest, ChatResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    host: String,
    provider: &'static str,
}

impl ChatClient {
    pub fn new(host: impl Into<String>, provider: &'static str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Misconfiguration(e.to_string()))?;
        Ok(Self {
            client,
            host: host.into(),
            provider,
        })
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.host.trim_end_matches('/'));
        let response = self.client.post(&url).json(request).send().await;
        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(LlmError::Timeout {
                    provider: self.provider.to_string(),
                    elapsed_secs: DEFAULT_TIMEOUT.as_secs(),
                });
            }
            Err(e) => return Err(LlmError::Transport(e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(provider = self.provider, %status, "llm endpoint returned non-success");
            return Err(LlmError::ProviderError {
                provider: self.provider.to_string(),
                message: format!("{status}: {body}"),
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))
    }
}
