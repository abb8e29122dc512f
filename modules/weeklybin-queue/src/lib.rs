//! Named durable job queues: add/getJob/getState/getCompleted/getFailed,
//! retry with exponential backoff, retention, recurring schedulers, and a
//! concurrency-N worker harness (C2).

pub mod error;
pub mod queue;
pub mod types;
pub mod worker;

pub use error::{QueueError, Result};
pub use queue::{Queue, QueueHandle};
pub use types::{Backoff, JobOptions, JobRecord, RetentionPolicy, SchedulerDef};
pub use worker::{JobHandler, ProgressReporter, Worker};
