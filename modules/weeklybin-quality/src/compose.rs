//! Ties the three stages together the way C8 calls them (spec.md §4.4
//! "Composition"): blank-page heuristic, then visual, then content. The
//! first failing stage wins; its classification becomes the thrown failure.

use weeklybin_llm::ChatClient;
use weeklybin_model::{FailureClassification, FailureKind};

use crate::blank_page::is_blank_page;
use crate::content::ContentAnalysis;
use crate::extract::analyze_pdf_bytes;
use crate::visual::{score_screenshot, VisualScore};

pub const DEFAULT_QUALITY_THRESHOLD: i32 = 50;

/// Synthetic score used when the vision model was unreachable or returned
/// unparseable output even after the lenient fallback — never blocks the
/// pipeline on verifier unavailability (spec.md §4.8).
pub const VISION_UNAVAILABLE_SCORE: i32 = -1;

#[derive(Debug, Clone)]
pub enum QualityOutcome {
    Passed { visual: Option<VisualScore>, content: Option<ContentAnalysis> },
    Failed(FailureClassification),
}

fn issue_to_kind(issue: &str) -> FailureKind {
    match issue {
        "blank_page" => FailureKind::BlankPage,
        "paywall" => FailureKind::Paywall,
        "bot_detected" => FailureKind::BotDetected,
        "login_required" => FailureKind::MissingContent,
        "error_page" => FailureKind::MissingContent,
        "truncated" => FailureKind::Truncated,
        _ => FailureKind::QualityFailed,
    }
}

pub struct CompositionInput<'a> {
    pub screenshot_bytes: &'a [u8],
    pub pdf_bytes: &'a [u8],
    pub vision_model: &'a str,
    pub quality_threshold: i32,
}

pub async fn run(client: &ChatClient, input: CompositionInput<'_>) -> QualityOutcome {
    if is_blank_page(input.screenshot_bytes.len(), input.pdf_bytes.len()) {
        return QualityOutcome::Failed(FailureClassification::new(
            FailureKind::BlankPage,
            "screenshot and pdf both below size floor",
        ));
    }

    let visual = if input.screenshot_bytes.is_empty() {
        None
    } else {
        Some(score_screenshot(client, input.vision_model, input.screenshot_bytes).await)
    };

    if let Some(v) = &visual {
        if v.score != VISION_UNAVAILABLE_SCORE && v.score < input.quality_threshold {
            let kind = v
                .issue
                .as_deref()
                .map(issue_to_kind)
                .unwrap_or(FailureKind::QualityFailed);
            return QualityOutcome::Failed(FailureClassification::new(kind, v.reasoning.clone()));
        }
    }

    let content = analyze_pdf_bytes(input.pdf_bytes);

    {
        let c = &content;
        if !c.passed {
            let kind = c
                .reason
                .as_deref()
                .map(|r| match r {
                    "error_page" => FailureKind::MissingContent,
                    "paywall" => FailureKind::Paywall,
                    "truncated" => FailureKind::Truncated,
                    _ => FailureKind::QualityFailed,
                })
                .unwrap_or(FailureKind::QualityFailed);
            let reason = c.reason.clone().unwrap_or_default();
            return QualityOutcome::Failed(FailureClassification::new(kind, reason));
        }
    }

    QualityOutcome::Passed {
        visual,
        content: Some(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_maps_cover_all_named_issues() {
        assert_eq!(issue_to_kind("blank_page"), FailureKind::BlankPage);
        assert_eq!(issue_to_kind("paywall"), FailureKind::Paywall);
        assert_eq!(issue_to_kind("bot_detected"), FailureKind::BotDetected);
        assert_eq!(issue_to_kind("login_required"), FailureKind::MissingContent);
        assert_eq!(issue_to_kind("error_page"), FailureKind::MissingContent);
        assert_eq!(issue_to_kind("something_new"), FailureKind::QualityFailed);
    }
}
