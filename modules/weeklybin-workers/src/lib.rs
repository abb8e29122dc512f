//! Job handlers for the three worker queues: C8 conversion, C9 media
//! collection, C10 podcast transcription (spec.md §4.8–§4.10).

mod conversion;
mod error;
mod media;
mod podcast;

pub use conversion::ConversionHandler;
pub use media::MediaHandler;
pub use podcast::PodcastHandler;
