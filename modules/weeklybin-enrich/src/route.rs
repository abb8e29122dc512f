//! Routing predicates (spec.md §4.7 steps 1, 5, 6).

const ASSET_URL_MARKER: &str = "/api/assets/";

const PODCAST_HOSTS: &[&str] = &["podcasts.apple.com", "open.spotify.com"];

const VIDEO_ONLY_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
];

/// Asset URLs (pre-rendered PDFs/media fetched straight from the source
/// API) are not web pages and skip enrichment entirely.
#[must_use]
pub fn is_asset_url(url: &str) -> bool {
    url.contains(ASSET_URL_MARKER)
}

#[must_use]
pub fn is_podcast_url(url: &str) -> bool {
    host_of(url).is_some_and(|host| PODCAST_HOSTS.contains(&host.as_str()))
}

#[must_use]
pub fn is_video_only_url(url: &str) -> bool {
    host_of(url).is_some_and(|host| VIDEO_ONLY_HOSTS.contains(&host.as_str()))
}

fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url).ok()?.host_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_asset_urls() {
        assert!(is_asset_url("https://example.com/api/assets/abc123"));
        assert!(!is_asset_url("https://example.com/article/abc123"));
    }

    #[test]
    fn recognizes_podcast_hosts() {
        assert!(is_podcast_url("https://podcasts.apple.com/us/podcast/x/id1?i=10"));
        assert!(is_podcast_url("https://open.spotify.com/episode/abc"));
        assert!(!is_podcast_url("https://example.com/podcast/x"));
    }

    #[test]
    fn recognizes_video_only_hosts() {
        assert!(is_video_only_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_video_only_url("https://youtu.be/abc"));
        assert!(!is_video_only_url("https://example.com/watch?v=abc"));
    }

    #[test]
    fn unparseable_url_is_neither() {
        assert!(!is_podcast_url("not a url"));
        assert!(!is_video_only_url("not a url"));
    }
}
