//! Open Graph / JSON-LD / Twitter Card metadata extraction (spec.md §4.7 step 2).

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

#[derive(Debug, Clone, Default)]
pub struct WebMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

static JSON_LD_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?si)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#).expect("valid regex"));

/// Best-effort extraction; every field is independently optional, mirroring
/// how real pages carry an incomplete subset of these tags.
#[must_use]
pub fn extract_metadata(html: &str) -> WebMetadata {
    let document = Html::parse_document(html);

    let title = meta_property(&document, "og:title")
        .or_else(|| meta_name(&document, "twitter:title"))
        .or_else(|| title_tag(&document));

    let description = meta_property(&document, "og:description")
        .or_else(|| meta_name(&document, "twitter:description"))
        .or_else(|| meta_name(&document, "description"));

    let image = meta_property(&document, "og:image").or_else(|| meta_name(&document, "twitter:image"));

    let publisher = meta_property(&document, "og:site_name").or_else(|| meta_name(&document, "twitter:site"));

    let (json_ld_author, json_ld_date) = json_ld_author_and_date(html);

    let author = meta_property(&document, "article:author")
        .or_else(|| meta_name(&document, "author"))
        .or(json_ld_author);

    let published_at = meta_property(&document, "article:published_time")
        .as_deref()
        .and_then(parse_date)
        .or(json_ld_date)
        .or_else(|| meta_name(&document, "date").as_deref().and_then(parse_date));

    WebMetadata {
        title,
        author,
        description,
        image,
        publisher,
        published_at,
    }
}

fn meta_property(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn meta_name(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn title_tag(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn json_ld_author_and_date(html: &str) -> (Option<String>, Option<DateTime<Utc>>) {
    for cap in JSON_LD_SCRIPT.captures_iter(html) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&cap[1]) else {
            continue;
        };
        let nodes: Vec<&serde_json::Value> = match value.get("@graph").and_then(|g| g.as_array()) {
            Some(graph) => graph.iter().collect(),
            None => vec![&value],
        };
        for node in nodes {
            let author = node
                .get("author")
                .and_then(|a| a.get("name").and_then(|n| n.as_str()).or_else(|| a.as_str()))
                .map(str::to_string);
            let date = node
                .get("datePublished")
                .or_else(|| node.get("dateModified"))
                .and_then(|v| v.as_str())
                .and_then(parse_date);
            if author.is_some() || date.is_some() {
                return (author, date);
            }
        }
    }
    (None, None)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_og_fields() {
        let html = r#"
            <html><head>
            <meta property="og:title" content="A Great Article">
            <meta property="og:description" content="It is great.">
            <meta property="og:image" content="https://example.com/img.png">
            <meta property="og:site_name" content="Example News">
            </head></html>
        "#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title.as_deref(), Some("A Great Article"));
        assert_eq!(meta.description.as_deref(), Some("It is great."));
        assert_eq!(meta.image.as_deref(), Some("https://example.com/img.png"));
        assert_eq!(meta.publisher.as_deref(), Some("Example News"));
    }

    #[test]
    fn falls_back_to_title_tag() {
        let html = "<html><head><title>Plain Title</title></head></html>";
        let meta = extract_metadata(html);
        assert_eq!(meta.title.as_deref(), Some("Plain Title"));
    }

    #[test]
    fn falls_back_to_twitter_card() {
        let html = r#"
            <html><head>
            <meta name="twitter:title" content="Tweet-style title">
            <meta name="twitter:description" content="tweet desc">
            </head></html>
        "#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title.as_deref(), Some("Tweet-style title"));
        assert_eq!(meta.description.as_deref(), Some("tweet desc"));
    }

    #[test]
    fn extracts_json_ld_author_and_date() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@type":"NewsArticle","author":{"name":"Jane Doe"},"datePublished":"2025-06-15T10:30:00Z"}
            </script>
            </head></html>
        "#;
        let meta = extract_metadata(html);
        assert_eq!(meta.author.as_deref(), Some("Jane Doe"));
        assert_eq!(
            meta.published_at.unwrap().format("%Y-%m-%d").to_string(),
            "2025-06-15"
        );
    }

    #[test]
    fn article_published_time_meta_wins_over_json_ld_when_present() {
        let html = r#"
            <html><head>
            <meta property="article:published_time" content="2025-01-01T00:00:00Z">
            <script type="application/ld+json">
            {"datePublished":"2025-06-01T00:00:00Z"}
            </script>
            </head></html>
        "#;
        let meta = extract_metadata(html);
        assert_eq!(
            meta.published_at.unwrap().format("%Y-%m-%d").to_string(),
            "2025-01-01"
        );
    }

    #[test]
    fn no_metadata_returns_all_none() {
        let meta = extract_metadata("<html><body>nothing here</body></html>");
        assert!(meta.title.is_none());
        assert!(meta.author.is_none());
        assert!(meta.published_at.is_none());
    }
}
