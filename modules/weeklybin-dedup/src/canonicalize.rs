//! Pure URL canonicalization (spec.md §4.1).
//!
//! `canonicalize` is the identity function dedup and the weekly-bin store
//! build filenames from. It must be idempotent and insensitive to a leading
//! `www.` subdomain — both are covered by the test table below.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static UTM_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^utm_\w+").expect("valid regex"));

const EXACT_TRACKING_PARAMS: &[&str] = &["ref", "source", "fbclid", "gclid", "msclkid"];

fn is_tracking_param(name: &str) -> bool {
    UTM_PARAM.is_match(name) || EXACT_TRACKING_PARAMS.contains(&name)
}

/// Canonicalize a URL per spec.md §4.1. Falls back to the original string
/// (unmodified) if it doesn't parse as a URL at all — callers (C1) never see
/// this path used for feed items, which are always well-formed absolute URLs,
/// but it keeps the function total.
#[must_use]
pub fn canonicalize(input: &str) -> String {
    let Ok(mut url) = Url::parse(input) else {
        return input.to_string();
    };

    // Drop the fragment entirely — this also removes text fragments
    // (`#:~:text=...`), which are always encoded as part of the fragment.
    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        if let Some(stripped) = host.strip_prefix("www.") {
            let stripped = stripped.to_string();
            let _ = url.set_host(Some(&stripped));
        }
    }

    // Sort query params and drop tracking ones.
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .filter(|(k, _)| !is_tracking_param(k))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let qs = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&qs));
    }

    // Strip a trailing slash, and a lone `/` path entirely.
    let path = url.path().to_string();
    if path == "/" {
        url.set_path("");
    } else if let Some(trimmed) = path.strip_suffix('/') {
        url.set_path(trimmed);
    }

    url.to_string()
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        let cases = [
            "https://example.com/a?b=1&a=2#frag",
            "https://www.example.com/a/",
            "https://example.com/",
            "https://example.com",
            "https://news.ycombinator.com/item?id=1&utm_source=x",
        ];
        for u in cases {
            let once = canonicalize(u);
            let twice = canonicalize(&once);
            assert_eq!(once, twice, "not idempotent for {u}");
        }
    }

    #[test]
    fn www_insensitive() {
        let with_www = "https://www.example.com/a?b=1";
        let without_www = "https://example.com/a?b=1";
        assert_eq!(canonicalize(with_www), canonicalize(without_www));
    }

    #[test]
    fn strips_hash_fragment() {
        assert_eq!(
            canonicalize("https://example.com/a#section"),
            "https://example.com/a"
        );
    }

    #[test]
    fn strips_text_fragment() {
        assert_eq!(
            canonicalize("https://example.com/a#:~:text=hello"),
            "https://example.com/a"
        );
    }

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(canonicalize("https://example.com/a/"), "https://example.com/a");
    }

    #[test]
    fn strips_lone_slash_path() {
        assert_eq!(canonicalize("https://example.com/"), "https://example.com");
    }

    #[test]
    fn sorts_query_params() {
        assert_eq!(
            canonicalize("https://example.com/a?z=1&a=2"),
            canonicalize("https://example.com/a?a=2&z=1")
        );
    }

    #[test]
    fn removes_utm_params() {
        assert_eq!(
            canonicalize("https://example.com/a?utm_source=x&utm_campaign=y&keep=1"),
            "https://example.com/a?keep=1"
        );
    }

    #[test]
    fn removes_exact_tracking_params() {
        for param in ["ref", "source", "fbclid", "gclid", "msclkid"] {
            let u = format!("https://example.com/a?{param}=x&keep=1");
            assert_eq!(canonicalize(&u), "https://example.com/a?keep=1", "param {param}");
        }
    }

    #[test]
    fn does_not_strip_non_tracking_params_with_ref_substring() {
        // `referrer` must NOT be treated as the exact param `ref`.
        assert_eq!(
            canonicalize("https://example.com/a?referrer=x"),
            "https://example.com/a?referrer=x"
        );
    }

    #[test]
    fn preserves_non_www_subdomains() {
        assert_eq!(
            canonicalize("https://blog.example.com/a"),
            "https://blog.example.com/a"
        );
    }

    #[test]
    fn drops_query_entirely_when_only_tracking_params() {
        assert_eq!(
            canonicalize("https://example.com/a?utm_source=x"),
            "https://example.com/a"
        );
    }
}
