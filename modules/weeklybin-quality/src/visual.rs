//! Vision-model scoring stage (spec.md §4.4).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;
use weeklybin_llm::{ChatClient, ChatMessage, ChatRequest};

const PROMPT: &str = "This image is a screenshot of the top ~800px of a web page capture. \
It intentionally does not show the full page — do not flag it as truncated or incomplete \
merely because content continues below the fold. Assess whether this capture is usable: is \
it blank, a paywall, a bot-detection/CAPTCHA challenge, a login wall, or an error page? \
Respond with ONLY a JSON object: {\"score\": <0-100>, \"issue\": <one of \"blank_page\", \
\"paywall\", \"bot_detected\", \"login_required\", \"error_page\", or null>, \"reasoning\": <string>}.";

#[derive(Debug, Clone, Deserialize)]
pub struct VisualScore {
    pub score: i32,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub reasoning: String,
}

impl VisualScore {
    fn fallback() -> Self {
        Self {
            score: 0,
            issue: Some("unknown".to_string()),
            reasoning: "model response could not be parsed".to_string(),
        }
    }

    fn clamp(mut self) -> Self {
        self.score = self.score.clamp(0, 100);
        self
    }
}

static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

/// Strict JSON first; otherwise the first `{...}` block containing a
/// `"score"` key; otherwise a synthetic zero-score fallback. Never fails.
#[must_use]
pub fn parse_lenient(raw: &str) -> VisualScore {
    if let Ok(parsed) = serde_json::from_str::<VisualScore>(raw.trim()) {
        return parsed.clamp();
    }
    for candidate in JSON_BLOCK.find_iter(raw) {
        if !candidate.as_str().contains("\"score\"") {
            continue;
        }
        if let Ok(parsed) = serde_json::from_str::<VisualScore>(candidate.as_str()) {
            return parsed.clamp();
        }
    }
    VisualScore::fallback()
}

pub async fn score_screenshot(client: &ChatClient, model: &str, png_bytes: &[u8]) -> VisualScore {
    let image_b64 = BASE64.encode(png_bytes);
    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user_with_image(PROMPT, image_b64)],
        stream: false,
        options: None,
    };

    match client.chat(&request).await {
        Ok(response) => parse_lenient(&response.text()),
        Err(err) => {
            warn!(error = %err, "vision model unreachable or errored");
            // The queue/worker layer treats this as a synthetic pass with
            // score=-1 (spec.md §4.8) — not this crate's job to decide that,
            // just to signal "no verdict available".
            VisualScore {
                score: -1,
                issue: None,
                reasoning: format!("vision model error: {err}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_json() {
        let v = parse_lenient(r#"{"score": 80, "issue": null, "reasoning": "looks fine"}"#);
        assert_eq!(v.score, 80);
        assert!(v.issue.is_none());
    }

    #[test]
    fn extracts_first_json_block_from_chatter() {
        let raw = "Sure, here you go:\n```json\n{\"score\": 42, \"issue\": \"paywall\"}\n```\nhope that helps";
        let v = parse_lenient(raw);
        assert_eq!(v.score, 42);
        assert_eq!(v.issue.as_deref(), Some("paywall"));
    }

    #[test]
    fn falls_back_when_nothing_parses() {
        let v = parse_lenient("I cannot assess this image.");
        assert_eq!(v.score, 0);
        assert_eq!(v.issue.as_deref(), Some("unknown"));
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let v = parse_lenient(r#"{"score": 500, "issue": null}"#);
        assert_eq!(v.score, 100);
        let v = parse_lenient(r#"{"score": -30, "issue": null}"#);
        assert_eq!(v.score, 0);
    }
}
