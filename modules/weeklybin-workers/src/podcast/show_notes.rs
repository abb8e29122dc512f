//! Podcast RSS fetch + episode show-notes matching (spec.md §4.10 step 2).

use scraper::{Html, Selector};
use weeklybin_model::{ShowNoteLink, ShowNotes};

/// Fetches and parses the podcast's RSS feed, then matches the entry whose
/// title equals `episode_title` (case-insensitive, trimmed) or whose id
/// equals `episode_guid`. Returns `ShowNotes::default()` on any fetch,
/// parse, or match failure — missing show notes never fail the job.
pub async fn fetch_show_notes(
    client: &reqwest::Client,
    feed_url: &str,
    episode_title: &str,
    episode_guid: Option<&str>,
) -> ShowNotes {
    match try_fetch_show_notes(client, feed_url, episode_title, episode_guid).await {
        Some(notes) => notes,
        None => ShowNotes::default(),
    }
}

async fn try_fetch_show_notes(
    client: &reqwest::Client,
    feed_url: &str,
    episode_title: &str,
    episode_guid: Option<&str>,
) -> Option<ShowNotes> {
    let body = client.get(feed_url).send().await.ok()?.bytes().await.ok()?;
    let feed = feed_rs::parser::parse(&body[..]).ok()?;

    let wanted_title = episode_title.trim().to_lowercase();
    let entry = feed.entries.into_iter().find(|entry| {
        let title_matches = entry
            .title
            .as_ref()
            .is_some_and(|t| t.content.trim().to_lowercase() == wanted_title);
        let guid_matches = episode_guid.is_some_and(|guid| entry.id == guid);
        title_matches || guid_matches
    })?;

    let html = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| entry.summary.map(|s| s.content))?;

    Some(notes_from_html(&html))
}

fn notes_from_html(html: &str) -> ShowNotes {
    let document = Html::parse_fragment(html);
    let Ok(anchor_selector) = Selector::parse("a") else {
        return ShowNotes {
            summary: plain_text(&document),
            links: Vec::new(),
            footer: None,
        };
    };

    let links: Vec<ShowNoteLink> = document
        .select(&anchor_selector)
        .filter_map(|el| {
            let url = el.value().attr("href")?.to_string();
            let text = el.text().collect::<String>().trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(ShowNoteLink { text, url, source: None })
        })
        .collect();

    ShowNotes {
        summary: plain_text(&document),
        links,
        footer: None,
    }
}

fn plain_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_links_and_summary_from_html() {
        let html = r#"<p>Check out <a href="https://example.com/sponsor">our sponsor</a> and more.</p>"#;
        let notes = notes_from_html(html);
        assert_eq!(notes.links.len(), 1);
        assert_eq!(notes.links[0].url, "https://example.com/sponsor");
        assert_eq!(notes.links[0].text, "our sponsor");
        assert!(notes.summary.contains("Check out"));
    }

    #[test]
    fn anchors_without_text_are_skipped() {
        let html = r#"<a href="https://example.com"><img src="x.png"/></a>"#;
        let notes = notes_from_html(html);
        assert!(notes.links.is_empty());
    }
}
