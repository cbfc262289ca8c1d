//! Schema creation for `taco init`.
//!
//! Every statement is `IF NOT EXISTS`, so running it against an existing
//! database is a no-op. The five ingredient tables share one shape; the
//! full taco table adds one nullable foreign key per category.

use anyhow::Result;
use sqlx::SqlitePool;

use tacofancy_core::models::{Category, Collection};

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Ingredient tables
    for category in Category::ALL {
        let table = Collection::from(category).table();
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                url TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                recipe TEXT NOT NULL DEFAULT ''
            )
            "#
        ))
        .execute(pool)
        .await?;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_slug ON {table}(slug)"
        ))
        .execute(pool)
        .await?;
    }

    // Full tacos, one slot per category
    let slots: Vec<String> = Category::ALL
        .iter()
        .map(|c| {
            format!(
                "{} TEXT REFERENCES {}(url) ON DELETE SET NULL",
                c.link_column(),
                Collection::from(*c).table()
            )
        })
        .collect();
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS full_taco (
            url TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            recipe TEXT NOT NULL DEFAULT '',
            {}
        )
        "#,
        slots.join(",\n            ")
    ))
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_full_taco_slug ON full_taco(slug)")
        .execute(pool)
        .await?;

    // Contributors
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contributor (
            username TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            avatar_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Contributor ↔ record associations, across all collections
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contribution (
            username TEXT NOT NULL,
            collection TEXT NOT NULL,
            url TEXT NOT NULL,
            PRIMARY KEY (username, collection, url),
            FOREIGN KEY (username) REFERENCES contributor(username) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_contribution_record ON contribution(collection, url)",
    )
    .execute(pool)
    .await?;

    // History-walk checkpoints
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_checkpoint (
            sync_kind TEXT PRIMARY KEY,
            last_commit_id TEXT,
            last_sync_time INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
