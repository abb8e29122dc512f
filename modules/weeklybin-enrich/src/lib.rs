//! C7 metadata enricher + router: OG/JSON-LD/Twitter-card extraction over a
//! plain HTTP fetch, merged with feed-provided fields, then routed to the
//! media, podcast, or conversion queue.

pub mod error;
pub mod extract;
pub mod fetch;
pub mod handler;
pub mod pipeline;
pub mod route;

pub use error::{EnrichError, Result};
pub use extract::{extract_metadata, WebMetadata};
pub use fetch::{build_client, fetch_html};
pub use handler::EnrichHandler;
pub use pipeline::{process, RouteOutcome};
pub use route::{is_asset_url, is_podcast_url, is_video_only_url};
