//! URL rewrites applied before navigation (spec.md §4.3 step 1).
//!
//! Three rules, applied in order: strip a publisher's tracking params,
//! rewrite a chart-embed wrapper to its CDN embed form, and mirror a
//! recognized social-media host to a configured alternative (e.g. a Nitter
//! instance for X/Twitter).

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static TRACKING_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(mbid|utm_\w+|intcid)$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub url: String,
    pub rewritten: bool,
    pub is_social: bool,
}

/// Apply the three rewrite rules in order. `social_mirror_host`, if set,
/// replaces `x.com`/`twitter.com` with the given host (scheme and path
/// preserved).
#[must_use]
pub fn apply_rewrites(input: &str, social_mirror_host: Option<&str>) -> RewriteResult {
    let mut rewritten = false;
    let mut current = input.to_string();

    if let Some(stripped) = strip_publisher_tracking(&current) {
        current = stripped;
        rewritten = true;
    }

    if let Some(embed) = rewrite_chart_embed(&current) {
        current = embed;
        rewritten = true;
    }

    let is_social = is_social_media_url(&current);
    if is_social {
        if let Some(mirrored) = mirror_social_host(&current, social_mirror_host) {
            current = mirrored;
            rewritten = true;
        }
    }

    RewriteResult {
        url: current,
        rewritten,
        is_social,
    }
}

/// The Atlantic-style publisher: strips `mbid`/`utm_*`/`intcid` tracking
/// params, leaving the rest of the query string intact.
fn strip_publisher_tracking(input: &str) -> Option<String> {
    let mut url = Url::parse(input).ok()?;
    if !url.host_str()?.ends_with("theatlantic.com") {
        return None;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .filter(|(k, _)| !TRACKING_PARAM.is_match(k))
        .collect();
    if pairs.len() == url.query_pairs().count() {
        return None;
    }
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let qs = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&qs));
    }
    Some(url.to_string())
}

/// Datawrapper's shareable chart page (`datawrapper.de/_/<id>`) rewritten to
/// its lightweight CDN embed form, which renders without the surrounding
/// site chrome.
fn rewrite_chart_embed(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    let host = url.host_str()?;
    if host != "www.datawrapper.de" && host != "datawrapper.de" {
        return None;
    }
    let mut segments = url.path_segments()?;
    if segments.next()? != "_" {
        return None;
    }
    let chart_id = segments.next()?;
    if chart_id.is_empty() {
        return None;
    }
    Some(format!("https://datawrapper.dwcdn.net/{chart_id}/"))
}

fn is_social_media_url(input: &str) -> bool {
    let Ok(url) = Url::parse(input) else {
        return false;
    };
    matches!(url.host_str(), Some("x.com" | "www.x.com" | "twitter.com" | "www.twitter.com"))
}

fn mirror_social_host(input: &str, mirror_host: Option<&str>) -> Option<String> {
    let mirror_host = mirror_host?;
    let mut url = Url::parse(input).ok()?;
    url.set_host(Some(mirror_host)).ok()?;
    Some(url.to_string())
}

/// A known article-path substring that appears on the mirror host when it
/// can only produce a stub instead of a full thread render (spec.md §4.3
/// step 5).
#[must_use]
pub fn is_unsupported_article_stub(body: &str) -> bool {
    body.contains("/article/") || body.contains("Unsupported tweet type")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_atlantic_tracking_params() {
        let r = apply_rewrites(
            "https://www.theatlantic.com/ideas/archive/2026/01/x?mbid=abc&utm_source=rss&keep=1",
            None,
        );
        assert!(r.rewritten);
        assert!(!r.url.contains("mbid"));
        assert!(!r.url.contains("utm_source"));
        assert!(r.url.contains("keep=1"));
    }

    #[test]
    fn leaves_non_atlantic_urls_untouched() {
        let r = apply_rewrites("https://example.com/a?mbid=abc", None);
        assert!(!r.rewritten);
        assert_eq!(r.url, "https://example.com/a?mbid=abc");
    }

    #[test]
    fn rewrites_datawrapper_share_link_to_cdn_embed() {
        let r = apply_rewrites("https://www.datawrapper.de/_/AbCdE/", None);
        assert!(r.rewritten);
        assert_eq!(r.url, "https://datawrapper.dwcdn.net/AbCdE/");
    }

    #[test]
    fn mirrors_social_host_when_configured() {
        let r = apply_rewrites("https://x.com/someone/status/123", Some("nitter.net"));
        assert!(r.is_social);
        assert!(r.rewritten);
        assert!(r.url.contains("nitter.net"));
    }

    #[test]
    fn social_url_without_mirror_host_is_flagged_but_unrewritten_for_that_step() {
        let r = apply_rewrites("https://twitter.com/someone/status/123", None);
        assert!(r.is_social);
        assert!(r.url.contains("twitter.com"));
    }

    #[test]
    fn detects_unsupported_article_stub() {
        assert!(is_unsupported_article_stub("see the /article/123 for more"));
        assert!(!is_unsupported_article_stub("a normal tweet thread"));
    }
}
