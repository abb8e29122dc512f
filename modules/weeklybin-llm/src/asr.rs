//! ASR transcription client (spec.md §4.10, §9).
//!
//! The platform's default HTTP client timeout caps out around five minutes
//! in most runtimes; transcribing anything beyond ~12 minutes of audio needs
//! a transport with its timeouts raised explicitly. This client is built
//! with a dedicated [`reqwest::Client`] rather than reusing [`ChatClient`]'s
//! so that one footgun can't silently regress the other.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::warn;

use crate::error::{LlmError, Result};
use crate::types::AsrResponse;

/// Headers/body must be allowed to run for hours; audio transcription on a
/// loaded ASR backend can take longer than the audio itself.
const ASR_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);
const ASR_CONNECT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct AsrClient {
    client: Client,
    host: String,
}

impl AsrClient {
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(ASR_CONNECT_TIMEOUT)
            .timeout(ASR_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Misconfiguration(e.to_string()))?;
        Ok(Self {
            client,
            host: host.into(),
        })
    }

    pub async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| LlmError::Decode(format!("failed to read {audio_path:?}: {e}")))?;
        let filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let part = Part::bytes(bytes).file_name(filename);
        let form = Form::new().part("audio_file", part);

        let url = format!("{}/asr?output=txt", self.host.trim_end_matches('/'));
        let response = match self.client.post(&url).multipart(form).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(LlmError::Timeout {
                    provider: "asr".to_string(),
                    elapsed_secs: ASR_TIMEOUT.as_secs(),
                });
            }
            Err(e) => return Err(LlmError::Transport(e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ProviderError {
                provider: "asr".to_string(),
                message: format!("{status}: {body}"),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        match serde_json::from_str::<AsrResponse>(&body) {
            Ok(parsed) => Ok(parsed.text),
            Err(_) => {
                warn!("asr response was not JSON, treating as plain text");
                Ok(body)
            }
        }
    }
}
