//! C6 feed poller: conditional HTTP fetch, RSS-enclosure and paginated-API
//! parsers, two-level dedup, fan-out to the metadata-extraction queue.

pub mod cache;
pub mod error;
pub mod poller;
pub mod source_a;
pub mod source_b;

pub use cache::{FeedCache, FeedCacheStore};
pub use error::{FeedError, Result};
pub use poller::{poll, FeedEndpoint, PollOutcome};
