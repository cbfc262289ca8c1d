//! SQLite implementation of [`EntityStore`].
//!
//! All reads and writes go through one lazily-opened transaction, so reads
//! observe uncommitted writes and a dropped store rolls everything back.
//! `commit` and `rollback` close the transaction; the next call opens a
//! fresh one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool, SqliteRow};
use sqlx::{Row, Transaction};
use tokio::sync::Mutex;
use tracing::warn;

use tacofancy_core::models::{
    Category, Collection, ComponentLinks, CompositeRecipe, Contributor, IngredientRecord,
    SyncCheckpoint,
};
use tacofancy_core::store::EntityStore;
use tacofancy_core::{SyncError, SyncResult};

use crate::config::Config;
use crate::db;

pub struct SqliteStore {
    pool: SqlitePool,
    session: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            session: Mutex::new(None),
        }
    }

    /// Connect using the `[db]` section.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Discard any open session and close the pool.
    pub async fn close(self) {
        if let Err(e) = self.rollback().await {
            warn!(error = %e, "rollback on close failed");
        }
        self.pool.close().await;
    }
}

fn db_err(e: sqlx::Error) -> SyncError {
    SyncError::store(e)
}

/// Connection of the open transaction, beginning one if needed.
async fn session_conn<'s>(
    pool: &SqlitePool,
    slot: &'s mut Option<Transaction<'static, Sqlite>>,
) -> SyncResult<&'s mut SqliteConnection> {
    if slot.is_none() {
        *slot = Some(pool.begin().await.map_err(db_err)?);
    }
    slot.as_deref_mut()
        .ok_or_else(|| SyncError::store("no open transaction"))
}

fn to_record(row: &SqliteRow) -> SyncResult<IngredientRecord> {
    Ok(IngredientRecord {
        url: row.try_get("url").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        slug: row.try_get("slug").map_err(db_err)?,
        recipe: row.try_get("recipe").map_err(db_err)?,
    })
}

fn to_contributor(row: &SqliteRow) -> SyncResult<Contributor> {
    Ok(Contributor {
        username: row.try_get("username").map_err(db_err)?,
        display_name: row.try_get("display_name").map_err(db_err)?,
        avatar_url: row.try_get("avatar_url").map_err(db_err)?,
    })
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn get_record(
        &self,
        collection: Collection,
        url: &str,
    ) -> SyncResult<Option<IngredientRecord>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let row = sqlx::query(&format!(
            "SELECT url, name, slug, recipe FROM {} WHERE url = ?",
            collection.table()
        ))
        .bind(url)
        .fetch_optional(conn)
        .await
        .map_err(db_err)?;
        row.as_ref().map(to_record).transpose()
    }

    async fn upsert_record(
        &self,
        collection: Collection,
        record: &IngredientRecord,
    ) -> SyncResult<()> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (url, name, slug, recipe)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug,
                recipe = excluded.recipe
            "#,
            collection.table()
        ))
        .bind(&record.url)
        .bind(&record.name)
        .bind(&record.slug)
        .bind(&record.recipe)
        .execute(conn)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_record(&self, collection: Collection, url: &str) -> SyncResult<bool> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;

        sqlx::query("DELETE FROM contribution WHERE collection = ? AND url = ?")
            .bind(collection.as_str())
            .bind(url)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;

        if let Some(category) = collection.category() {
            let column = category.link_column();
            sqlx::query(&format!(
                "UPDATE full_taco SET {column} = NULL WHERE {column} = ?"
            ))
            .bind(url)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        }

        let result = sqlx::query(&format!("DELETE FROM {} WHERE url = ?", collection.table()))
            .bind(url)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_records(&self, collection: Collection) -> SyncResult<Vec<IngredientRecord>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let rows = sqlx::query(&format!(
            "SELECT url, name, slug, recipe FROM {} ORDER BY url ASC",
            collection.table()
        ))
        .fetch_all(conn)
        .await
        .map_err(db_err)?;
        rows.iter().map(to_record).collect()
    }

    async fn find_by_slug(
        &self,
        collection: Collection,
        slug: &str,
    ) -> SyncResult<Option<IngredientRecord>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let row = sqlx::query(&format!(
            "SELECT url, name, slug, recipe FROM {} WHERE slug = ? ORDER BY url ASC LIMIT 1",
            collection.table()
        ))
        .bind(slug)
        .fetch_optional(conn)
        .await
        .map_err(db_err)?;
        row.as_ref().map(to_record).transpose()
    }

    async fn count_records(&self, collection: Collection) -> SyncResult<u64> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", collection.table()))
            .fetch_one(conn)
            .await
            .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }

    async fn record_at(
        &self,
        collection: Collection,
        offset: u64,
    ) -> SyncResult<Option<IngredientRecord>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let row = sqlx::query(&format!(
            "SELECT url, name, slug, recipe FROM {} ORDER BY url ASC LIMIT 1 OFFSET ?",
            collection.table()
        ))
        .bind(offset as i64)
        .fetch_optional(conn)
        .await
        .map_err(db_err)?;
        row.as_ref().map(to_record).transpose()
    }

    async fn get_composite(&self, url: &str) -> SyncResult<Option<CompositeRecipe>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let row = sqlx::query("SELECT * FROM full_taco WHERE url = ?")
            .bind(url)
            .fetch_optional(conn)
            .await
            .map_err(db_err)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut components = ComponentLinks::default();
        for category in Category::ALL {
            let target: Option<String> = row.try_get(category.link_column()).map_err(db_err)?;
            components.set(category, target);
        }
        Ok(Some(CompositeRecipe {
            record: to_record(&row)?,
            components,
        }))
    }

    async fn set_component(
        &self,
        composite_url: &str,
        category: Category,
        ingredient_url: &str,
    ) -> SyncResult<()> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let result = sqlx::query(&format!(
            "UPDATE full_taco SET {} = ? WHERE url = ?",
            category.link_column()
        ))
        .bind(ingredient_url)
        .bind(composite_url)
        .execute(conn)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(SyncError::store(format!(
                "no full taco stored at {}",
                composite_url
            )));
        }
        Ok(())
    }

    async fn get_contributor(&self, username: &str) -> SyncResult<Option<Contributor>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let row = sqlx::query(
            "SELECT username, display_name, avatar_url FROM contributor WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(conn)
        .await
        .map_err(db_err)?;
        row.as_ref().map(to_contributor).transpose()
    }

    async fn insert_contributor(&self, contributor: &Contributor) -> SyncResult<()> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        sqlx::query(
            "INSERT OR IGNORE INTO contributor (username, display_name, avatar_url) VALUES (?, ?, ?)",
        )
        .bind(&contributor.username)
        .bind(&contributor.display_name)
        .bind(&contributor.avatar_url)
        .execute(conn)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn add_contribution(
        &self,
        username: &str,
        collection: Collection,
        url: &str,
    ) -> SyncResult<bool> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO contribution (username, collection, url) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(collection.as_str())
        .bind(url)
        .execute(conn)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn contributors_of(
        &self,
        collection: Collection,
        url: &str,
    ) -> SyncResult<Vec<Contributor>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let rows = sqlx::query(
            r#"
            SELECT c.username, c.display_name, c.avatar_url
            FROM contribution x
            JOIN contributor c ON c.username = x.username
            WHERE x.collection = ? AND x.url = ?
            ORDER BY c.username ASC
            "#,
        )
        .bind(collection.as_str())
        .bind(url)
        .fetch_all(conn)
        .await
        .map_err(db_err)?;
        rows.iter().map(to_contributor).collect()
    }

    async fn get_checkpoint(&self, sync_kind: &str) -> SyncResult<Option<SyncCheckpoint>> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        let row = sqlx::query(
            "SELECT sync_kind, last_commit_id, last_sync_time FROM sync_checkpoint WHERE sync_kind = ?",
        )
        .bind(sync_kind)
        .fetch_optional(conn)
        .await
        .map_err(db_err)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let ts: i64 = row.try_get("last_sync_time").map_err(db_err)?;
        Ok(Some(SyncCheckpoint {
            sync_kind: row.try_get("sync_kind").map_err(db_err)?,
            last_commit_id: row.try_get("last_commit_id").map_err(db_err)?,
            last_sync_time: DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default(),
        }))
    }

    async fn put_checkpoint(&self, checkpoint: &SyncCheckpoint) -> SyncResult<()> {
        let mut session = self.session.lock().await;
        let conn = session_conn(&self.pool, &mut session).await?;
        sqlx::query(
            r#"
            INSERT INTO sync_checkpoint (sync_kind, last_commit_id, last_sync_time)
            VALUES (?, ?, ?)
            ON CONFLICT(sync_kind) DO UPDATE SET
                last_commit_id = excluded.last_commit_id,
                last_sync_time = excluded.last_sync_time
            "#,
        )
        .bind(&checkpoint.sync_kind)
        .bind(&checkpoint.last_commit_id)
        .bind(checkpoint.last_sync_time.timestamp())
        .execute(conn)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn commit(&self) -> SyncResult<()> {
        if let Some(tx) = self.session.lock().await.take() {
            tx.commit().await.map_err(db_err)?;
        }
        Ok(())
    }

    async fn rollback(&self) -> SyncResult<()> {
        if let Some(tx) = self.session.lock().await.take() {
            tx.rollback().await.map_err(db_err)?;
        }
        Ok(())
    }
}
