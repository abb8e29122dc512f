//! Builds the configured feed endpoints for the runner from `Config`
//! (spec.md §4.6: Source A is a plain RSS URL, Source B carries its bearer
//! token in the URL's userinfo).

use weeklybin_feeds::FeedEndpoint;
use weeklybin_feeds::source_b::extract_bearer_token;
use weeklybin_model::{Config, FeedSource};

#[must_use]
pub fn configured_sources(config: &Config) -> Vec<(FeedSource, FeedEndpoint)> {
    let mut sources = Vec::new();

    if let Some(url) = &config.feed_url_rss {
        sources.push((FeedSource::RssEnclosure, FeedEndpoint::Rss { url: url.clone() }));
    }

    if let Some(url) = &config.feed_url_api {
        let (base_url, token) = extract_bearer_token(url);
        sources.push((FeedSource::PaginatedApi, FeedEndpoint::PaginatedApi { base_url, token }));
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sources_when_unconfigured() {
        let mut config = Config::for_tests();
        config.feed_url_rss = None;
        config.feed_url_api = None;
        assert!(configured_sources(&config).is_empty());
    }

    #[test]
    fn rss_source_configured_alone() {
        let mut config = Config::for_tests();
        config.feed_url_rss = Some("https://example.com/feed.xml".to_string());
        config.feed_url_api = None;
        let sources = configured_sources(&config);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0, FeedSource::RssEnclosure);
    }
}
