//! Recipe sync orchestration for the CLI.
//!
//! Wires the SQLite store, the GitHub fetcher and a progress reporter into
//! a [`SyncContext`], runs the ingestion engine, and prints a summary on
//! stdout.

use anyhow::{Context, Result};

use tacofancy_core::ingest::{IngestionEngine, PreheatSummary, SyncContext};
use tacofancy_core::progress::SyncProgressReporter;
use tacofancy_core::source::{CollectionMap, RemoteSource};

use crate::config::Config;
use crate::github::GitHubFetcher;
use crate::progress::ProgressMode;
use crate::sqlite_store::SqliteStore;

/// Everything one sync command needs, owned for the length of the command.
pub struct Pipeline {
    pub store: SqliteStore,
    pub fetcher: GitHubFetcher,
    pub remote: RemoteSource,
    pub collections: CollectionMap,
    pub progress: Box<dyn SyncProgressReporter>,
}

impl Pipeline {
    pub async fn connect(config: &Config, progress: ProgressMode) -> Result<Self> {
        let collections = CollectionMap::standard();
        let fetcher = GitHubFetcher::new(&config.remote, collections.clone())
            .context("Failed to build GitHub client")?;
        let store = SqliteStore::open(config).await?;
        Ok(Self {
            store,
            fetcher,
            remote: config.remote.source(),
            collections,
            progress: progress.reporter(),
        })
    }

    pub fn context(&self) -> SyncContext<'_> {
        SyncContext {
            fetcher: &self.fetcher,
            store: &self.store,
            remote: &self.remote,
            collections: &self.collections,
            progress: self.progress.as_ref(),
        }
    }

    pub async fn close(self) {
        self.store.close().await;
    }
}

pub async fn preheat(config: &Config, progress: ProgressMode) -> Result<PreheatSummary> {
    let pipeline = Pipeline::connect(config, progress).await?;
    let result = IngestionEngine::new(pipeline.context()).preheat().await;
    pipeline.close().await;
    result.context("Recipe sync failed")
}

/// CLI entry point for `taco preheat`.
pub async fn run_preheat(config: &Config, progress: ProgressMode) -> Result<()> {
    let summary = preheat(config, progress).await?;

    println!("preheat");
    for outcome in &summary.collections {
        println!(
            "  {}: {} fetched, {} created, {} updated, {} deleted, {} skipped",
            outcome.collection,
            outcome.upserted.len(),
            outcome.created,
            outcome.updated,
            outcome.deleted,
            outcome.skipped
        );
    }
    println!(
        "  full tacos linked: {} slots across {} tacos ({} unresolved)",
        summary.links.linked, summary.links.composites, summary.links.unresolved
    );
    println!("ok");
    Ok(())
}
