//! Clients for the two Ollama-shaped chat endpoints plus the long-timeout
//! ASR transport (spec.md §6).

mod asr;
mod client;
mod error;
mod transcript;
mod types;

pub use asr::AsrClient;
pub use client::ChatClient;
pub use error::{LlmError, Result};
pub use transcript::{clean_srt, looks_like_srt};
pub use types::{ChatMessage, ChatOptions, ChatRequest, ChatResponse, ChatResponseMessage, MessageRole};
