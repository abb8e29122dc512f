//! URL parse + iTunes lookup (spec.md §4.10 steps 1-2).

use serde::Deserialize;
use weeklybin_model::{FailureKind, PodcastMetadata, ShowNotes};

use crate::error::classified;

#[derive(Debug, Clone)]
pub struct PodcastUrlParts {
    pub country: String,
    pub podcast_id: u64,
    pub episode_id: u64,
    pub slug: String,
}

/// Parses `https://podcasts.apple.com/{country}/podcast/{slug}/id{podcastId}?i={episodeId}`.
pub fn parse_apple_podcast_url(url: &str) -> anyhow::Result<PodcastUrlParts> {
    let parsed = url::Url::parse(url)
        .map_err(|e| classified(FailureKind::Unknown, format!("unparseable podcast url: {e}")))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    let country = segments.first().copied().unwrap_or("us").to_string();
    let slug = segments.get(2).copied().unwrap_or("").to_string();
    let podcast_id = segments
        .get(3)
        .and_then(|s| s.strip_prefix("id"))
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| classified(FailureKind::Unknown, "podcast url missing podcast id segment"))?;

    let episode_id = parsed
        .query_pairs()
        .find(|(k, _)| k == "i")
        .and_then(|(_, v)| v.parse::<u64>().ok())
        .ok_or_else(|| classified(FailureKind::Unknown, "podcast url missing episode id (?i=)"))?;

    Ok(PodcastUrlParts {
        country,
        podcast_id,
        episode_id,
        slug,
    })
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<serde_json::Value>,
}

/// `entity=podcastEpisode&limit=200`: extracts the single podcast record
/// plus the episode matching `trackId == episodeId`. Fails descriptively
/// if the episode isn't in the first (and only) batch fetched.
pub async fn lookup(
    client: &reqwest::Client,
    parts: &PodcastUrlParts,
) -> anyhow::Result<(PodcastMetadata, Option<String>)> {
    let url = format!(
        "https://itunes.apple.com/lookup?id={}&country={}&entity=podcastEpisode&limit=200",
        parts.podcast_id, parts.country
    );
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| classified(FailureKind::NavigationError, format!("itunes lookup failed: {e}")))?;

    if !response.status().is_success() {
        return Err(classified(
            FailureKind::NavigationError,
            format!("itunes lookup returned {}", response.status()),
        ));
    }

    let body: LookupResponse = response
        .json()
        .await
        .map_err(|e| classified(FailureKind::Unknown, format!("itunes lookup decode failed: {e}")))?;

    let podcast = body
        .results
        .iter()
        .find(|r| r.get("wrapperType").and_then(|v| v.as_str()) == Some("track"))
        .ok_or_else(|| classified(FailureKind::MissingContent, "itunes lookup returned no podcast record"))?;

    let episode = body
        .results
        .iter()
        .find(|r| {
            r.get("wrapperType").and_then(|v| v.as_str()) == Some("podcastEpisode")
                && r.get("trackId").and_then(|v| v.as_u64()) == Some(parts.episode_id)
        })
        .ok_or_else(|| {
            classified(
                FailureKind::MissingContent,
                format!(
                    "episode {} not found among the first {} results for podcast {}",
                    parts.episode_id,
                    body.results.len(),
                    parts.podcast_id
                ),
            )
        })?;

    let audio_url = episode
        .get("episodeUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| classified(FailureKind::MissingContent, "episode has no audio url"))?
        .to_string();

    let release_date = episode
        .get("releaseDate")
        .and_then(|v| v.as_str())
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc));

    let feed_url = podcast
        .get("feedUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let metadata = PodcastMetadata {
        country: parts.country.clone(),
        podcast_id: parts.podcast_id,
        episode_id: parts.episode_id,
        podcast_name: podcast
            .get("collectionName")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown podcast")
            .to_string(),
        episode_title: episode
            .get("trackName")
            .and_then(|v| v.as_str())
            .unwrap_or("Untitled episode")
            .to_string(),
        genre: podcast
            .get("genres")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .map(str::to_string),
        host: podcast
            .get("artistName")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        audio_url,
        duration_ms: episode.get("trackTimeMillis").and_then(serde_json::Value::as_u64),
        release_date,
        show_notes: ShowNotes::default(),
    };

    Ok((metadata, feed_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_apple_podcast_episode_url() {
        let parts = parse_apple_podcast_url(
            "https://podcasts.apple.com/us/podcast/some-show/id123456789?i=987654321",
        )
        .unwrap();
        assert_eq!(parts.country, "us");
        assert_eq!(parts.slug, "some-show");
        assert_eq!(parts.podcast_id, 123456789);
        assert_eq!(parts.episode_id, 987654321);
    }

    #[test]
    fn missing_episode_id_is_an_error() {
        assert!(parse_apple_podcast_url("https://podcasts.apple.com/us/podcast/x/id1").is_err());
    }

    #[test]
    fn missing_podcast_id_is_an_error() {
        assert!(parse_apple_podcast_url("https://podcasts.apple.com/us/podcast/x?i=1").is_err());
    }
}
