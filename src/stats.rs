//! Database statistics and health overview.
//!
//! Summarises what has been synced: records per collection, how many full
//! tacos are linked to their components, contributors, and when the last
//! history walk finished. Used by `taco stats`.

use anyhow::Result;
use sqlx::Row;

use tacofancy_core::models::{Category, Collection};

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("tacofancy — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:      {}", config.db.path.display());
    println!("  Size:          {}", format_bytes(db_size));
    println!();
    println!("  {:<14} {:>8}", "COLLECTION", "RECORDS");
    println!("  {}", "-".repeat(23));
    for collection in Collection::ALL {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", collection.table()))
            .fetch_one(&pool)
            .await?;
        println!("  {:<14} {:>8}", collection.as_str(), count);
    }

    let any_linked = Category::ALL
        .iter()
        .map(|c| format!("{} IS NOT NULL", c.link_column()))
        .collect::<Vec<_>>();
    let linked: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM full_taco WHERE {}",
        any_linked.join(" OR ")
    ))
    .fetch_one(&pool)
    .await?;
    let complete: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM full_taco WHERE {}",
        any_linked.join(" AND ")
    ))
    .fetch_one(&pool)
    .await?;

    let contributors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contributor")
        .fetch_one(&pool)
        .await?;
    let contributions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contribution")
        .fetch_one(&pool)
        .await?;

    println!();
    println!("  Linked tacos:  {} ({} complete)", linked, complete);
    println!("  Contributors:  {}", contributors);
    println!("  Associations:  {}", contributions);

    let checkpoints = sqlx::query(
        "SELECT sync_kind, last_commit_id, last_sync_time FROM sync_checkpoint ORDER BY sync_kind",
    )
    .fetch_all(&pool)
    .await?;

    println!();
    if checkpoints.is_empty() {
        println!("  Last sync:     never");
    }
    for row in &checkpoints {
        let kind: String = row.get("sync_kind");
        let commit: Option<String> = row.get("last_commit_id");
        let ts: i64 = row.get("last_sync_time");
        println!(
            "  Last sync:     {} at {} ({})",
            kind,
            commit.as_deref().map(short_sha).unwrap_or("-"),
            format_ts_relative(ts)
        );
    }
    println!();

    pool.close().await;
    Ok(())
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_humanised() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn recent_timestamps_are_relative() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
    }

    #[test]
    fn short_sha_truncates() {
        assert_eq!(short_sha("0123456789abcdef"), "0123456");
        assert_eq!(short_sha("abc"), "abc");
    }
}
