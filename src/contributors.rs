//! `taco contributors`: attribute contributors from commit history.

use anyhow::{Context, Result};

use tacofancy_core::attribute::{AttributionSummary, ContributorAttributor};

use crate::config::Config;
use crate::ingest::Pipeline;
use crate::progress::ProgressMode;

/// Walk commit history. `full` ignores the stored checkpoint.
pub async fn attribute(
    config: &Config,
    full: bool,
    progress: ProgressMode,
) -> Result<AttributionSummary> {
    let pipeline = Pipeline::connect(config, progress).await?;
    let result = ContributorAttributor::new(pipeline.context(), config.sync.commit_batch_size)
        .run(!full)
        .await;
    pipeline.close().await;
    result.context("Contributor sync failed")
}

pub async fn run_contributors(config: &Config, full: bool, progress: ProgressMode) -> Result<()> {
    let summary = attribute(config, full, progress).await?;

    println!("contributors{}", if full { " (full)" } else { "" });
    println!("  commits processed: {}", summary.processed);
    println!("  commits skipped: {}", summary.skipped);
    if summary.deferred > 0 {
        println!("  commits deferred to next run: {}", summary.deferred);
    }
    println!("  new contributors: {}", summary.contributors_created);
    println!("  associations added: {}", summary.associations_added);
    println!(
        "  checkpoint: {}",
        summary
            .new_checkpoint
            .as_deref()
            .or(summary.previous_checkpoint.as_deref())
            .unwrap_or("none")
    );
    println!("ok");
    Ok(())
}
