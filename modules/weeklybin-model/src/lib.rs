pub mod config;
pub mod error;
pub mod failure;
pub mod types;

pub use config::Config;
pub use error::ModelError;
pub use failure::{FailureClassification, FailureKind};
pub use types::{
    BookmarkItem, ConversionJob, ConversionResult, Enclosure, FeedSource, JobState, MediaItem,
    MediaType, PodcastMetadata, ShowNoteLink, ShowNotes, Transcript, TranscriptSegment, WeeklyBinId,
};
