//! Enrich-then-route orchestration (spec.md §4.7).

use chrono::Utc;
use weeklybin_model::{BookmarkItem, ConversionJob, MediaItem, MediaType};
use weeklybin_queue::{JobOptions, Queue};

use crate::error::Result;
use crate::{extract, fetch, route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Enqueued to the media-collection queue (enclosure present).
    Media,
    /// Enqueued to the podcast-transcription queue.
    Podcast,
    /// Video-only host with no enclosure; nothing further to do.
    VideoOnlyStopped,
    /// Enqueued to the conversion (URL-to-PDF) queue.
    Conversion,
}

/// Runs one item through enrichment and routing, mutating and enqueueing
/// as it goes. `client` is the plain (non-browser) metadata-fetch client
/// from [`fetch::build_client`].
pub async fn process(
    mut item: BookmarkItem,
    client: &reqwest::Client,
    conversion_queue: &Queue,
    media_queue: &Queue,
    podcast_queue: &Queue,
) -> Result<RouteOutcome> {
    if !route::is_asset_url(&item.original_url) {
        match fetch::fetch_html(client, &item.original_url).await {
            Some(html) => {
                let meta = extract::extract_metadata(&html);
                item.title = meta.title.or(item.title.take());
                item.author = meta.author;
                item.description = meta.description;
                item.image = meta.image;
                item.publisher = meta.publisher;
                item.published_at = meta.published_at;
            }
            None => {
                // Failure's minimal metadata is `{title: hostname, url}`, merged by the
                // same "web-extracted wins" rule as a successful fetch (spec.md §4.7
                // steps 2-3): the hostname replaces any feed-provided title, it doesn't
                // merely fill a gap.
                item.title = Some(hostname_of(&item.original_url));
            }
        }
    }
    item.title.get_or_insert_with(|| "Untitled".to_string());
    item.bookmarked_at.get_or_insert_with(Utc::now);

    if let Some(enclosure) = item.enclosure.clone() {
        let media_type = item.media_type.unwrap_or(MediaType::Video);
        let job_id = sanitize_job_id(&item.canonical_url);
        let media_item = MediaItem {
            bookmark: item,
            enclosure,
            media_type,
        };
        media_queue.add(Some(job_id), &media_item, JobOptions::retryable()).await?;
        return Ok(RouteOutcome::Media);
    }

    if route::is_podcast_url(&item.canonical_url) {
        let job = conversion_job_for(&item);
        podcast_queue.add(None, &job, JobOptions::retryable()).await?;
        return Ok(RouteOutcome::Podcast);
    }

    if route::is_video_only_url(&item.canonical_url) {
        return Ok(RouteOutcome::VideoOnlyStopped);
    }

    let job = conversion_job_for(&item);
    conversion_queue.add(None, &job, JobOptions::retryable()).await?;
    Ok(RouteOutcome::Conversion)
}

fn conversion_job_for(item: &BookmarkItem) -> ConversionJob {
    ConversionJob {
        url: item.canonical_url.clone(),
        original_url: item.original_url.clone(),
        title: item.title.clone(),
        bookmarked_at: item.bookmarked_at,
        old_file_path: None,
    }
}

fn hostname_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Job ids must be safe to use as Redis hash fields and stay stable across
/// retries; canonical URLs carry `:`, `/`, `?` that aren't worth escaping.
fn sanitize_job_id(canonical_url: &str) -> String {
    canonical_url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_job_id_strips_punctuation() {
        let id = sanitize_job_id("https://example.com/a?b=1");
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn hostname_of_extracts_host() {
        assert_eq!(hostname_of("https://example.com/a/b"), "example.com");
    }

    #[test]
    fn hostname_of_falls_back_to_input_on_parse_failure() {
        assert_eq!(hostname_of("not a url"), "not a url");
    }
}
