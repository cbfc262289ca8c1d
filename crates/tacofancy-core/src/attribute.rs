//! Contributor attribution from commit history.
//!
//! The attributor walks commits newest-first, derives a contributor from
//! each commit's author, and associates that contributor with every stored
//! record whose document the commit touched.
//!
//! # Checkpoints
//!
//! The newest commit id seen in a run is stored under a sync kind
//! (`"contributors"` by default). An incremental run stops as soon as it
//! meets that id. The checkpoint is written in the same store session as
//! the final batch, so it never points past work that was rolled back.
//! Processing is at-least-once: a crash after some batches committed means
//! the next run re-reads those commits, which is harmless because
//! associations are idempotent.
//!
//! A commit whose file list could not be fetched for a transient reason
//! holds the checkpoint where it was, so the next incremental run walks
//! back over it.
//!
//! ```text
//! Idle ──run()──▶ Streaming ──stream ends / checkpoint met──▶ Checkpointing ──▶ Idle
//!                     │
//!                     └── page failure / store failure ──────────────────────▶ Idle
//! ```

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::SyncResult;
use crate::fetch::{iterate_commits, CommitAuthor};
use crate::ingest::{abort, SyncContext};
use crate::models::{Collection, Contributor, SyncCheckpoint};
use crate::progress::SyncProgressEvent;
use crate::source::is_recipe_file;

/// Sync kind under which the contributor checkpoint is stored.
pub const CONTRIBUTORS_SYNC_KIND: &str = "contributors";

/// Processed commits per store commit, unless configured otherwise.
pub const DEFAULT_COMMIT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributorState {
    Idle,
    Streaming,
    Checkpointing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributionSummary {
    /// Commits whose files were examined.
    pub processed: u64,
    /// Commits without a usable author, or whose file list could not be fetched.
    pub skipped: u64,
    pub contributors_created: u64,
    pub associations_added: u64,
    /// Whether the walk ended on the stored checkpoint.
    pub reached_checkpoint: bool,
    /// Checkpoint the run started from, if incremental.
    pub previous_checkpoint: Option<String>,
    /// Checkpoint written by this run. `None` when nothing was processed
    /// or a commit was skipped on a transient failure.
    pub new_checkpoint: Option<String>,
    /// Commits skipped because their file list was temporarily unavailable.
    pub deferred: u64,
}

pub struct ContributorAttributor<'a> {
    ctx: SyncContext<'a>,
    batch_size: usize,
    sync_kind: String,
    state: AttributorState,
}

/// Per-run bookkeeping that never outlives one [`ContributorAttributor::run`].
#[derive(Default)]
struct RunState {
    seen_contributors: HashSet<String>,
    associated: HashSet<(String, Collection, String)>,
    newest: Option<String>,
}

impl<'a> ContributorAttributor<'a> {
    pub fn new(ctx: SyncContext<'a>, batch_size: usize) -> Self {
        Self {
            ctx,
            batch_size: batch_size.max(1),
            sync_kind: CONTRIBUTORS_SYNC_KIND.to_string(),
            state: AttributorState::Idle,
        }
    }

    pub fn with_sync_kind(mut self, sync_kind: impl Into<String>) -> Self {
        self.sync_kind = sync_kind.into();
        self
    }

    pub fn state(&self) -> AttributorState {
        self.state
    }

    /// Walk commit history and attribute contributors.
    ///
    /// With `incremental` the walk stops at the stored checkpoint; otherwise
    /// the whole history is read and a fresh checkpoint is written.
    pub async fn run(&mut self, incremental: bool) -> SyncResult<AttributionSummary> {
        let mut summary = AttributionSummary::default();
        if incremental {
            summary.previous_checkpoint = self
                .ctx
                .store
                .get_checkpoint(&self.sync_kind)
                .await?
                .and_then(|cp| cp.last_commit_id);
        }
        info!(
            sync_kind = %self.sync_kind,
            incremental,
            checkpoint = summary.previous_checkpoint.as_deref().unwrap_or("none"),
            "walking commit history"
        );

        self.state = AttributorState::Streaming;
        let mut run = RunState::default();
        let streamed = self.stream(&mut run, &mut summary).await;

        let result = match streamed {
            Ok(()) => {
                self.state = AttributorState::Checkpointing;
                self.checkpoint(&run, &mut summary).await
            }
            Err(e) if e.is_transient() => {
                // Keep finished batches; the checkpoint stays where it was.
                warn!(error = %e, "commit history unavailable, stopping early");
                match self.ctx.store.commit().await {
                    Ok(()) => Err(e),
                    Err(store_err) => Err(abort(self.ctx.store, store_err).await),
                }
            }
            Err(e) => Err(abort(self.ctx.store, e).await),
        };

        self.state = AttributorState::Idle;
        result.map(|()| summary)
    }

    async fn stream(&self, run: &mut RunState, summary: &mut AttributionSummary) -> SyncResult<()> {
        let stop_at = summary.previous_checkpoint.clone();
        let mut commits = iterate_commits(self.ctx.fetcher);

        while let Some(commit) = commits.next().await? {
            if stop_at.as_deref() == Some(commit.id.as_str()) {
                debug!(commit = %commit.id, "reached checkpoint");
                summary.reached_checkpoint = true;
                break;
            }
            if run.newest.is_none() {
                run.newest = Some(commit.id.clone());
            }

            let Some(contributor) = contributor_from_author(&commit.author) else {
                warn!(commit = %commit.id, "commit has no usable author, skipping");
                summary.skipped += 1;
                continue;
            };

            let files = match self.ctx.fetcher.commit_files(&commit.id).await {
                Ok(files) => files,
                Err(e) if e.is_transient() => {
                    warn!(commit = %commit.id, error = %e, "commit files unavailable, retrying next run");
                    summary.skipped += 1;
                    summary.deferred += 1;
                    continue;
                }
                Err(e) if e.is_not_found() => {
                    warn!(commit = %commit.id, "commit no longer exists, skipping");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.ensure_contributor(&contributor, run, summary).await?;
            for path in &files {
                self.attribute_file(&contributor.username, path, run, summary)
                    .await?;
            }

            summary.processed += 1;
            self.ctx.progress.report(SyncProgressEvent::Attributing {
                commits: summary.processed,
            });
            if summary.processed % self.batch_size as u64 == 0 {
                self.ctx.store.commit().await?;
                debug!(processed = summary.processed, "batch committed");
            }
        }
        Ok(())
    }

    async fn ensure_contributor(
        &self,
        contributor: &Contributor,
        run: &mut RunState,
        summary: &mut AttributionSummary,
    ) -> SyncResult<()> {
        if !run.seen_contributors.insert(contributor.username.clone()) {
            return Ok(());
        }
        if self
            .ctx
            .store
            .get_contributor(&contributor.username)
            .await?
            .is_none()
        {
            self.ctx.store.insert_contributor(contributor).await?;
            info!(username = %contributor.username, "new contributor");
            summary.contributors_created += 1;
        }
        Ok(())
    }

    async fn attribute_file(
        &self,
        username: &str,
        path: &str,
        run: &mut RunState,
        summary: &mut AttributionSummary,
    ) -> SyncResult<()> {
        if !is_recipe_file(path) {
            return Ok(());
        }
        let Some(collection) = self.ctx.collections.collection_for_path(path) else {
            return Ok(());
        };
        let url = self.ctx.remote.canonical_url(path);
        let key = (username.to_string(), collection, url);
        if run.associated.contains(&key) {
            return Ok(());
        }
        if self.ctx.store.get_record(collection, &key.2).await?.is_none() {
            debug!(%path, "touched document is not stored");
            return Ok(());
        }
        if self
            .ctx
            .store
            .add_contribution(username, collection, &key.2)
            .await?
        {
            summary.associations_added += 1;
        }
        run.associated.insert(key);
        Ok(())
    }

    /// Write the checkpoint alongside the final batch.
    async fn checkpoint(
        &self,
        run: &RunState,
        summary: &mut AttributionSummary,
    ) -> SyncResult<()> {
        let result = async {
            if summary.deferred > 0 {
                warn!(
                    deferred = summary.deferred,
                    "commits left unattributed, checkpoint unchanged"
                );
            } else if summary.processed > 0 {
                if let Some(newest) = &run.newest {
                    self.ctx
                        .store
                        .put_checkpoint(&SyncCheckpoint {
                            sync_kind: self.sync_kind.clone(),
                            last_commit_id: Some(newest.clone()),
                            last_sync_time: Utc::now(),
                        })
                        .await?;
                    summary.new_checkpoint = Some(newest.clone());
                }
            }
            self.ctx.store.commit().await
        }
        .await;

        match result {
            Ok(()) => {
                info!(
                    processed = summary.processed,
                    skipped = summary.skipped,
                    contributors = summary.contributors_created,
                    associations = summary.associations_added,
                    checkpoint = summary.new_checkpoint.as_deref().unwrap_or("unchanged"),
                    "attribution finished"
                );
                Ok(())
            }
            Err(e) => {
                summary.new_checkpoint = None;
                Err(abort(self.ctx.store, e).await)
            }
        }
    }
}

/// Contributor identity for a commit author.
///
/// A platform login wins; otherwise the raw author name (or email when the
/// name is blank) becomes the username. Two people sharing a raw name share
/// a contributor row.
pub fn contributor_from_author(author: &CommitAuthor) -> Option<Contributor> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(login) = non_empty(&author.login) {
        return Some(Contributor {
            display_name: non_empty(&author.name).unwrap_or_else(|| login.clone()),
            username: login,
            avatar_url: non_empty(&author.avatar_url),
        });
    }

    let raw = non_empty(&author.name).or_else(|| non_empty(&author.email))?;
    Some(Contributor {
        username: raw.clone(),
        display_name: raw,
        avatar_url: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(login: Option<&str>, name: Option<&str>, email: Option<&str>) -> CommitAuthor {
        CommitAuthor {
            login: login.map(str::to_string),
            avatar_url: login.map(|l| format!("https://avatars.example/{}", l)),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn login_wins_over_raw_name() {
        let c = contributor_from_author(&author(Some("sinker"), Some("Dan Sinker"), None)).unwrap();
        assert_eq!(c.username, "sinker");
        assert_eq!(c.display_name, "Dan Sinker");
        assert_eq!(c.avatar_url.as_deref(), Some("https://avatars.example/sinker"));
    }

    #[test]
    fn login_without_name_displays_login() {
        let c = contributor_from_author(&author(Some("sinker"), None, None)).unwrap();
        assert_eq!(c.display_name, "sinker");
    }

    #[test]
    fn raw_name_fallback_has_no_avatar() {
        let c = contributor_from_author(&author(None, Some("Jane Doe"), Some("j@x.org"))).unwrap();
        assert_eq!(c.username, "Jane Doe");
        assert_eq!(c.avatar_url, None);
    }

    #[test]
    fn email_used_when_name_blank() {
        let c = contributor_from_author(&author(None, Some("  "), Some("j@x.org"))).unwrap();
        assert_eq!(c.username, "j@x.org");
    }

    #[test]
    fn no_identity_means_no_contributor() {
        assert!(contributor_from_author(&author(None, None, None)).is_none());
        assert!(contributor_from_author(&author(Some(""), Some(""), Some(""))).is_none());
    }
}
