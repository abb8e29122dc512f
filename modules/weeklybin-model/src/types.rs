use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The feed sources the poller knows how to parse (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    /// RSS feed with PDF enclosures (Source A).
    RssEnclosure,
    /// Paginated JSON API with a bearer token (Source B).
    PaginatedApi,
}

impl FeedSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RssEnclosure => "rss_enclosure",
            Self::PaginatedApi => "paginated_api",
        }
    }
}

/// Artifact kind produced for a bookmark, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Transcript,
    Podcast,
    Pdf,
}

impl MediaType {
    /// Pluralized form used in the weekly-bin directory layout
    /// (`videos`, `transcripts`, `podcasts`, `pdfs`).
    #[must_use]
    pub const fn plural(&self) -> &'static str {
        match self {
            Self::Video => "videos",
            Self::Transcript => "transcripts",
            Self::Podcast => "podcasts",
            Self::Pdf => "pdfs",
        }
    }
}

/// An enclosure attached to a feed item (spec.md §3 `BookmarkItem.enclosure`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: String,
    pub length: Option<u64>,
}

/// One feed entry, before or after enrichment (spec.md §3 `BookmarkItem`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkItem {
    pub original_url: String,
    pub canonical_url: String,
    pub guid: String,
    pub source: FeedSource,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub bookmarked_at: Option<DateTime<Utc>>,

    // Enrichment (filled by C7; absent until then).
    pub author: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,

    pub enclosure: Option<Enclosure>,
    pub media_type: Option<MediaType>,
}

impl BookmarkItem {
    /// The invariant from spec.md §3: `originalUrl` and `canonicalUrl`
    /// always travel together, so this constructor is the only path that
    /// creates a `BookmarkItem` without the two drifting apart.
    #[must_use]
    pub fn new(original_url: String, canonical_url: String, guid: String, source: FeedSource) -> Self {
        Self {
            original_url,
            canonical_url,
            guid,
            source,
            title: None,
            creator: None,
            bookmarked_at: None,
            author: None,
            description: None,
            image: None,
            publisher: None,
            published_at: None,
            enclosure: None,
            media_type: None,
        }
    }
}

/// A URL-to-PDF work unit (spec.md §3 `ConversionJob`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    pub url: String,
    pub original_url: String,
    pub title: Option<String>,
    pub bookmarked_at: Option<DateTime<Utc>>,
    /// Present on reruns; see the deletion-ordering invariant in spec.md §3.
    pub old_file_path: Option<String>,
}

/// Returned by the conversion worker on success (spec.md §3 `ConversionResult`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub pdf_path: String,
    pub pdf_size: u64,
    pub completed_at: DateTime<Utc>,
    pub url: String,
    pub quality_score: Option<i32>,
    pub quality_reasoning: Option<String>,
}

/// `BookmarkItem` extended with a required enclosure (spec.md §3 `MediaItem`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub bookmark: BookmarkItem,
    pub enclosure: Enclosure,
    pub media_type: MediaType,
}

/// A podcast show-notes link (spec.md §3 `PodcastMetadata`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowNoteLink {
    pub text: String,
    pub url: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowNotes {
    pub summary: String,
    pub links: Vec<ShowNoteLink>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastMetadata {
    pub country: String,
    pub podcast_id: u64,
    pub episode_id: u64,
    pub podcast_name: String,
    pub episode_title: String,
    pub genre: Option<String>,
    pub host: Option<String>,
    pub audio_url: String,
    pub duration_ms: Option<u64>,
    pub release_date: Option<DateTime<Utc>>,
    pub show_notes: ShowNotes,
}

/// A transcript segment (spec.md §3 `Transcript.segments`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Option<Vec<TranscriptSegment>>,
    pub language: Option<String>,
}

/// A weekly bin identity: a pure function of `(year, isoWeek, mediaType)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeeklyBinId {
    pub year: i32,
    pub iso_week: u32,
    pub media_type: MediaType,
}

/// Per-queue-record lifecycle state (spec.md §3 `JobState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Complete,
    Failed,
}

impl JobState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_plurals() {
        assert_eq!(MediaType::Video.plural(), "videos");
        assert_eq!(MediaType::Transcript.plural(), "transcripts");
        assert_eq!(MediaType::Podcast.plural(), "podcasts");
        assert_eq!(MediaType::Pdf.plural(), "pdfs");
    }

    #[test]
    fn bookmark_item_new_keeps_urls_together() {
        let item = BookmarkItem::new(
            "https://www.example.com/a".into(),
            "https://example.com/a".into(),
            "guid-1".into(),
            FeedSource::RssEnclosure,
        );
        assert_eq!(item.original_url, "https://www.example.com/a");
        assert_eq!(item.canonical_url, "https://example.com/a");
    }
}
