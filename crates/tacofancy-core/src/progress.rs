//! Progress events emitted by the ingestion engine and attributor.
//!
//! Renderers (stderr, JSON lines) live in the application crate.

use crate::models::Collection;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncProgressEvent {
    /// Listing the remote tree. Totals unknown.
    Discovering,
    /// `n` of `total` documents of one collection processed.
    Ingesting {
        collection: Collection,
        n: u64,
        total: u64,
    },
    /// `n` of `total` full tacos linked to their components.
    Linking { n: u64, total: u64 },
    /// Commits processed so far in the current history walk.
    Attributing { commits: u64 },
}

pub trait SyncProgressReporter: Send + Sync {
    fn report(&self, event: SyncProgressEvent);
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}
