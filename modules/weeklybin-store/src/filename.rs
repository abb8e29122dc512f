//! Basename derivation and sanitization (spec.md §4.5 step 3-4).

use once_cell::sync::Lazy;
use regex::Regex;

const NON_DESCRIPTIVE_TOKENS: &[&str] = &[
    "item", "comments", "post", "p", "a", "article", "story", "s",
];
const MAX_SLUG_LEN: usize = 50;
const MAX_BASENAME_LEN: usize = 100;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase, strip apostrophes, remove non-alphanumerics, collapse
/// whitespace/punctuation to `-`, trim, truncate.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase().replace(['\'', '\u{2019}'], "");
    let collapsed = NON_ALNUM.replace_all(&lowered, "-");
    let trimmed = collapsed.trim_matches('-');
    trimmed.chars().take(MAX_SLUG_LEN).collect::<String>().trim_end_matches('-').to_string()
}

/// `true` if the last non-empty path segment gives no descriptive
/// information on its own (spec.md's fixed token set).
#[must_use]
fn is_non_descriptive(path_segment: &str) -> bool {
    path_segment.is_empty() || NON_DESCRIPTIVE_TOKENS.contains(&path_segment)
}

/// Last path segment of a URL's path component, or empty string if none.
fn last_path_segment(url: &url::Url) -> &str {
    url.path_segments()
        .and_then(|mut segs| segs.next_back())
        .unwrap_or("")
}

/// Build the pre-sanitization basename from a URL (+ optional title).
/// `is_social_status` + `direct_article` implement the "one recognized
/// social-media domain" rewrite named in spec.md §4.5 step 3.
#[must_use]
pub fn build_base_name(
    url: &str,
    title: Option<&str>,
    is_social_status: bool,
    direct_article: bool,
) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return sanitize_filename::sanitize(url);
    };

    let host = parsed.host_str().unwrap_or("").trim_start_matches("www.");
    let path = parsed.path().trim_matches('/');
    let last_segment = last_path_segment(&parsed);

    let mut base = if path.is_empty() {
        host.to_string()
    } else {
        format!("{host}-{}", path.replace('/', "-"))
    };

    if is_non_descriptive(last_segment) {
        if let Some(title) = title {
            let slug = slugify(title);
            if !slug.is_empty() {
                base = format!("{host}-{slug}");
            }
        }
    }

    if is_social_status {
        let replacement = if direct_article { "article" } else { "post" };
        base = base.replace("status", replacement);
    }

    base
}

/// Sanitize for the filesystem, truncate, append the given extension
/// (no leading dot).
#[must_use]
pub fn finalize_filename(base_name: &str, extension: &str) -> String {
    let sanitized = sanitize_filename::sanitize(base_name);
    let truncated: String = sanitized.chars().take(MAX_BASENAME_LEN).collect();
    format!("{truncated}.{extension}")
}

/// Sanitize for the filesystem, truncate, append `.pdf`.
#[must_use]
pub fn finalize_pdf_filename(base_name: &str) -> String {
    finalize_filename(base_name, "pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_article_path_is_used_verbatim() {
        let base = build_base_name("https://example.com/a", None, false, false);
        assert_eq!(base, "example.com-a");
    }

    #[test]
    fn non_descriptive_path_falls_back_to_title_slug() {
        let base = build_base_name(
            "https://news.ycombinator.com/item?id=1",
            Some("Hello World"),
            false,
            false,
        );
        assert_eq!(base, "news.ycombinator.com-hello-world");
    }

    #[test]
    fn social_status_rewritten_to_article_or_post() {
        let base = build_base_name(
            "https://x.com/someone/status/123",
            None,
            true,
            true,
        );
        assert_eq!(base, "x.com-someone-article-123");

        let base = build_base_name("https://x.com/someone/status/123", None, true, false);
        assert_eq!(base, "x.com-someone-post-123");
    }

    #[test]
    fn slugify_strips_apostrophes_and_collapses_punctuation() {
        assert_eq!(slugify("Don't Panic: A Guide!"), "dont-panic-a-guide");
    }

    #[test]
    fn slugify_truncates_to_fifty_chars() {
        let long = "a".repeat(100);
        assert!(slugify(&long).len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn finalize_truncates_and_appends_extension() {
        let name = finalize_pdf_filename(&"x".repeat(200));
        assert!(name.ends_with(".pdf"));
        assert!(name.len() <= MAX_BASENAME_LEN + 4);
    }

    #[test]
    fn finalize_strips_path_unsafe_characters() {
        let name = finalize_pdf_filename("weird/../name?.pdf");
        assert!(!name.contains('/'));
        assert!(!name.contains('?'));
    }
}
