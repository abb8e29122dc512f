//! Event payloads for every worker stage (spec.md §4.8–§4.12).
//!
//! Each domain gets its own tagged enum, mirroring how the source splits
//! events by concern rather than keeping one flat enum; `Event` is a thin
//! wrapper that dispatches to whichever domain fired.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionEvent {
    Started {
        job_id: String,
        url: String,
    },
    Progress {
        job_id: String,
        url: String,
        stage: String,
    },
    Completed {
        job_id: String,
        url: String,
        pdf_path: String,
        pdf_size: u64,
        quality_score: f64,
        quality_reasoning: String,
        duration_ms: u64,
    },
    /// Only emitted when `attempts_made >= max_attempts` (terminal).
    Failed {
        job_id: String,
        url: String,
        failure_reason: String,
        attempts_made: u32,
        max_attempts: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaEvent {
    Started {
        job_id: String,
        url: String,
    },
    Completed {
        job_id: String,
        url: String,
        path: String,
        size_bytes: u64,
        duration_ms: u64,
    },
    Failed {
        job_id: String,
        url: String,
        failure_reason: String,
        attempts_made: u32,
        max_attempts: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PodcastEvent {
    Started {
        job_id: String,
        url: String,
    },
    TranscriptReady {
        job_id: String,
        url: String,
        segment_count: usize,
    },
    Completed {
        job_id: String,
        url: String,
        pdf_path: String,
        duration_ms: u64,
    },
    Failed {
        job_id: String,
        url: String,
        failure_reason: String,
        attempts_made: u32,
        max_attempts: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    PollCompleted {
        source: String,
        new_items: usize,
        duration_ms: u64,
    },
    PollFailed {
        source: String,
        error: String,
    },
    NotModified {
        source: String,
    },
}

/// Dispatch wrapper over the per-domain event enums. Serializes transparently
/// as whichever inner variant fired — consumers never see the `Conversion`/
/// `Media`/... wrapping in the JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    Conversion(ConversionEvent),
    Media(MediaEvent),
    Podcast(PodcastEvent),
    Feed(FeedEvent),
}

impl From<ConversionEvent> for Event {
    fn from(e: ConversionEvent) -> Self {
        Event::Conversion(e)
    }
}

impl From<MediaEvent> for Event {
    fn from(e: MediaEvent) -> Self {
        Event::Media(e)
    }
}

impl From<PodcastEvent> for Event {
    fn from(e: PodcastEvent) -> Self {
        Event::Podcast(e)
    }
}

impl From<FeedEvent> for Event {
    fn from(e: FeedEvent) -> Self {
        Event::Feed(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_completed_serializes_with_type_tag() {
        let event: Event = ConversionEvent::Completed {
            job_id: "j1".into(),
            url: "https://example.com".into(),
            pdf_path: "/bins/2026-W01/a.pdf".into(),
            pdf_size: 1024,
            quality_score: 0.9,
            quality_reasoning: "clear render".into(),
            duration_ms: 4200,
        }
        .into();
        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["type"], "completed");
        assert_eq!(payload["job_id"], "j1");
    }

    #[test]
    fn conversion_failed_roundtrips() {
        let event: Event = ConversionEvent::Failed {
            job_id: "j2".into(),
            url: "https://example.com".into(),
            failure_reason: "timeout: navigation deadline exceeded".into(),
            attempts_made: 3,
            max_attempts: 3,
        }
        .into();
        let payload = serde_json::to_value(&event).unwrap();
        let roundtripped: Event = serde_json::from_value(payload).unwrap();
        match roundtripped {
            Event::Conversion(ConversionEvent::Failed { attempts_made, max_attempts, .. }) => {
                assert_eq!(attempts_made, max_attempts);
            }
            _ => panic!("expected Conversion::Failed"),
        }
    }

    #[test]
    fn feed_poll_completed_roundtrips() {
        let event: Event = FeedEvent::PollCompleted {
            source: "source_a".into(),
            new_items: 12,
            duration_ms: 300,
        }
        .into();
        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["type"], "poll_completed");
        let roundtripped: Event = serde_json::from_value(payload).unwrap();
        match roundtripped {
            Event::Feed(FeedEvent::PollCompleted { new_items, .. }) => assert_eq!(new_items, 12),
            _ => panic!("expected Feed::PollCompleted"),
        }
    }
}
