//! Source A: RSS/Atom with PDF enclosures (spec.md §4.6).

use weeklybin_model::{BookmarkItem, Enclosure, FeedSource, MediaType};

/// Parses a raw feed body into `BookmarkItem`s. Items with a PDF enclosure
/// are tagged `mediaType = transcript`.
pub fn parse(body: &[u8]) -> crate::error::Result<Vec<BookmarkItem>> {
    let feed = feed_rs::parser::parse(body).map_err(|e| crate::error::FeedError::Parse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let guid = if entry.id.is_empty() { url.clone() } else { entry.id.clone() };
            let canonical_url = weeklybin_dedup::canonicalize(&url);

            let mut item = BookmarkItem::new(url, canonical_url, guid, FeedSource::RssEnclosure);
            item.title = entry.title.map(|t| t.content);
            item.bookmarked_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&chrono::Utc));

            if let Some(media) = entry.media.first() {
                if let Some(content) = media.content.first() {
                    let is_pdf = content
                        .content_type
                        .as_ref()
                        .map(|m| m.essence_str() == "application/pdf")
                        .unwrap_or(false);
                    if is_pdf {
                        if let Some(enclosure_url) = content.url.as_ref() {
                            item.enclosure = Some(Enclosure {
                                url: enclosure_url.to_string(),
                                mime_type: "application/pdf".to_string(),
                                length: content.length,
                            });
                            item.media_type = Some(MediaType::Transcript);
                        }
                    }
                }
            }

            Some(item)
        })
        .collect();

    Ok(items)
}
