//! C11 scheduler: registers an epoch-aligned recurring feed-poll schedule
//! and an offset batch-tick schedule at startup, then ticks them
//! (spec.md §4.11).

mod register;
mod runner;
mod sources;
mod tick;

pub use register::{register_startup_schedulers, BATCH_TICK_SCHEDULER_ID, FEED_POLL_SCHEDULER_ID};
pub use runner::{SchedulerRunner, SweptQueue};
pub use sources::configured_sources;
pub use tick::is_due;
