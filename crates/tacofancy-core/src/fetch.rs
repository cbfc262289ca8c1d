//! Remote content boundary.
//!
//! A [`DocumentFetcher`] lists tracked documents, reads raw document bodies,
//! and pages through commit history. It carries no business logic; the
//! ingestion engine and attributor decide what to do with each answer.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::source::TrackedDocuments;

/// Author identity attached to a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Platform account login, when the commit email is linked to one.
    pub login: Option<String>,
    pub avatar_url: Option<String>,
    /// Raw `git` author name and email.
    pub name: Option<String>,
    pub email: Option<String>,
}

/// One entry of the newest-first commit stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDescriptor {
    pub id: String,
    pub author: CommitAuthor,
}

/// One page of commit history.
#[derive(Debug, Clone, Default)]
pub struct CommitPage {
    pub commits: Vec<CommitDescriptor>,
    pub has_next: bool,
}

/// Read access to the remote recipe repository.
///
/// Errors must be classified: only a confirmed absence is
/// [`SyncError::NotFound`](crate::SyncError::NotFound); rate limits and
/// network failures are [`SyncError::Transient`](crate::SyncError::Transient).
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Enumerate the tracked branch and bucket markdown documents by collection.
    async fn list_tracked_documents(&self) -> SyncResult<TrackedDocuments>;

    /// Decoded text of one document.
    async fn read_document(&self, path: &str) -> SyncResult<String>;

    /// Commit history page `page` (1-based), newest first.
    async fn commit_page(&self, page: u32) -> SyncResult<CommitPage>;

    /// Repository paths touched by one commit.
    async fn commit_files(&self, commit_id: &str) -> SyncResult<Vec<String>>;
}

/// Lazy newest-first walk over commit history, one page at a time.
///
/// Pages are requested only when the buffered one is exhausted, so a caller
/// that stops early (checkpoint reached) never fetches older pages.
pub struct CommitStream<'a> {
    fetcher: &'a dyn DocumentFetcher,
    buffer: VecDeque<CommitDescriptor>,
    next_page: Option<u32>,
}

impl<'a> CommitStream<'a> {
    pub fn new(fetcher: &'a dyn DocumentFetcher) -> Self {
        Self {
            fetcher,
            buffer: VecDeque::new(),
            next_page: Some(1),
        }
    }

    pub async fn next(&mut self) -> SyncResult<Option<CommitDescriptor>> {
        while self.buffer.is_empty() {
            let Some(page) = self.next_page else {
                return Ok(None);
            };
            let fetched = self.fetcher.commit_page(page).await?;
            self.next_page = if fetched.has_next && !fetched.commits.is_empty() {
                Some(page + 1)
            } else {
                None
            };
            self.buffer.extend(fetched.commits);
        }
        Ok(self.buffer.pop_front())
    }
}

pub fn iterate_commits(fetcher: &dyn DocumentFetcher) -> CommitStream<'_> {
    CommitStream::new(fetcher)
}
