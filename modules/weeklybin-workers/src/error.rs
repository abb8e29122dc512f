//! Turns a [`FailureClassification`] into the `anyhow::Error` the worker
//! harness persists as `failedReason` — its `Display` is exactly the
//! `"{kind}: {message}"` wire format the API and reruns parse back out.

use weeklybin_model::{FailureClassification, FailureKind};

#[must_use]
pub fn classified(kind: FailureKind, message: impl Into<String>) -> anyhow::Error {
    anyhow::anyhow!(FailureClassification::new(kind, message).format())
}

#[must_use]
pub fn from_classification(c: FailureClassification) -> anyhow::Error {
    anyhow::anyhow!(c.format())
}
