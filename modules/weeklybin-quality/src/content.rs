//! PDF content analysis stage (spec.md §4.4): text density and known bad
//! patterns (error pages, paywalls, truncated renders).

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

const TRUNCATED_CHAR_FLOOR: usize = 500;
const LARGE_PDF_BYTES: usize = 500 * 1024;
const LARGE_PDF_CHAR_FLOOR: usize = 1000;
const LOW_DENSITY_CHARS_PER_KB: f64 = 5.0;
const LOW_DENSITY_CHAR_CEILING: usize = 3000;
const LOW_DENSITY_CHARS_PER_PAGE: f64 = 400.0;
const ERROR_PAGE_CHAR_CEILING: usize = 2000;

static ERROR_PAGE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)page (can'?t|cannot) be found",
        r"(?i)404 (error|not found)?",
        r"(?i)this page (doesn'?t|does not) exist",
        r"(?i)we couldn'?t find (that|the) page",
        r"(?i)page not found",
    ])
    .unwrap()
});

static PAYWALL_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)get unlimited access",
        r"(?i)subscribe to continue reading",
        r"(?i)\$\d+(\.\d{2})? (a|per|your first) month",
        r"(?i)you've reached your (free )?article limit",
        r"(?i)become a subscriber to (read|continue)",
        r"(?i)already a subscriber\? sign in",
    ])
    .unwrap()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentAnalysis {
    pub passed: bool,
    pub page_count: usize,
    pub char_count: usize,
    pub chars_per_kb: f64,
    pub reason: Option<String>,
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_string()
}

/// `None` page count means the parser couldn't determine pagination; the
/// low-density bypass is skipped in that case rather than guessed at.
#[must_use]
pub fn analyze(text: &str, pdf_size_bytes: usize, page_count: Option<usize>) -> ContentAnalysis {
    let collapsed = collapse_whitespace(text);
    let char_count = collapsed.chars().count();
    let page_count = page_count.unwrap_or(1);
    let chars_per_kb = if pdf_size_bytes == 0 {
        0.0
    } else {
        char_count as f64 / (pdf_size_bytes as f64 / 1024.0)
    };

    if char_count < ERROR_PAGE_CHAR_CEILING && ERROR_PAGE_PATTERNS.is_match(&collapsed) {
        return ContentAnalysis {
            passed: false,
            page_count,
            char_count,
            chars_per_kb,
            reason: Some("error_page".to_string()),
        };
    }

    if PAYWALL_PATTERNS.is_match(&collapsed) {
        return ContentAnalysis {
            passed: false,
            page_count,
            char_count,
            chars_per_kb,
            reason: Some("paywall".to_string()),
        };
    }

    if char_count < TRUNCATED_CHAR_FLOOR {
        return ContentAnalysis {
            passed: false,
            page_count,
            char_count,
            chars_per_kb,
            reason: Some("truncated".to_string()),
        };
    }

    if pdf_size_bytes > LARGE_PDF_BYTES && char_count < LARGE_PDF_CHAR_FLOOR {
        return ContentAnalysis {
            passed: false,
            page_count,
            char_count,
            chars_per_kb,
            reason: Some("truncated".to_string()),
        };
    }

    let chars_per_page = char_count as f64 / page_count.max(1) as f64;
    if page_count > 1
        && chars_per_kb < LOW_DENSITY_CHARS_PER_KB
        && char_count < LOW_DENSITY_CHAR_CEILING
        && chars_per_page < LOW_DENSITY_CHARS_PER_PAGE
    {
        return ContentAnalysis {
            passed: false,
            page_count,
            char_count,
            chars_per_kb,
            reason: Some("truncated".to_string()),
        };
    }

    ContentAnalysis {
        passed: true,
        page_count,
        char_count,
        chars_per_kb,
        reason: None,
    }
}

/// Parser failures never block the pipeline — pass with a note instead.
#[must_use]
pub fn analyze_unparseable(pdf_size_bytes: usize, parse_error: &str) -> ContentAnalysis {
    let _ = pdf_size_bytes;
    ContentAnalysis {
        passed: true,
        page_count: 0,
        char_count: 0,
        chars_per_kb: 0.0,
        reason: Some(format!("parser failure (passing open): {parse_error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_error_page() {
        let a = analyze("Sorry, this page can't be found.", 10_000, Some(1));
        assert!(!a.passed);
        assert_eq!(a.reason.as_deref(), Some("error_page"));
    }

    #[test]
    fn detects_paywall() {
        let a = analyze(
            "Subscribe to continue reading this exclusive report.",
            10_000,
            Some(1),
        );
        assert!(!a.passed);
        assert_eq!(a.reason.as_deref(), Some("paywall"));
    }

    #[test]
    fn too_little_text_is_truncated() {
        let a = analyze("short", 10_000, Some(1));
        assert!(!a.passed);
        assert_eq!(a.reason.as_deref(), Some("truncated"));
    }

    #[test]
    fn large_pdf_with_little_text_is_truncated() {
        let text = "word ".repeat(150); // ~750 chars, under the 1000 floor
        let a = analyze(&text, 600 * 1024, Some(1));
        assert!(!a.passed);
        assert_eq!(a.reason.as_deref(), Some("truncated"));
    }

    #[test]
    fn low_density_multi_page_is_truncated() {
        let text = "word ".repeat(200); // 1000 chars, spread across many pages
        let a = analyze(&text, 400 * 1024, Some(10));
        assert!(!a.passed);
        assert_eq!(a.reason.as_deref(), Some("truncated"));
    }

    #[test]
    fn healthy_article_passes() {
        let text = "word ".repeat(600); // 3000 chars
        let a = analyze(&text, 50 * 1024, Some(2));
        assert!(a.passed);
        assert!(a.reason.is_none());
    }

    #[test]
    fn parser_failure_passes_with_note() {
        let a = analyze_unparseable(12_345, "corrupt xref table");
        assert!(a.passed);
        assert!(a.reason.unwrap().contains("corrupt xref table"));
    }
}
