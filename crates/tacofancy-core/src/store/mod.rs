//! Storage abstraction for the recipe graph.
//!
//! The [`EntityStore`] trait is the persistence boundary used by the
//! ingestion engine, the attributor, and the read-side helpers. Writes go
//! into a session that stays open until [`commit`](EntityStore::commit);
//! reads observe the session's uncommitted writes. Dropping or rolling back
//! the session discards them, which is what keeps checkpoints honest after
//! a crash.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::models::{
    Category, Collection, CompositeRecipe, Contributor, IngredientRecord, SyncCheckpoint,
};

/// Abstract storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_record`](EntityStore::get_record) | Fetch a record by canonical URL |
/// | [`upsert_record`](EntityStore::upsert_record) | Create or overwrite name/slug/recipe |
/// | [`delete_record`](EntityStore::delete_record) | Remove a record and every reference to it |
/// | [`set_component`](EntityStore::set_component) | Point a full taco's category slot at a record |
/// | [`add_contribution`](EntityStore::add_contribution) | Associate a contributor with a record |
/// | [`put_checkpoint`](EntityStore::put_checkpoint) | Record history-walk progress |
/// | [`commit`](EntityStore::commit) | Make the open session durable |
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_record(
        &self,
        collection: Collection,
        url: &str,
    ) -> SyncResult<Option<IngredientRecord>>;

    /// Insert, or overwrite the mutable fields of, the record at `record.url`.
    ///
    /// For full tacos the component links are left untouched.
    async fn upsert_record(&self, collection: Collection, record: &IngredientRecord)
        -> SyncResult<()>;

    /// Delete a record, clearing full taco slots and contributions that
    /// reference it. Returns `false` when nothing was stored at `url`.
    async fn delete_record(&self, collection: Collection, url: &str) -> SyncResult<bool>;

    /// All records of a collection, ordered by URL.
    async fn list_records(&self, collection: Collection) -> SyncResult<Vec<IngredientRecord>>;

    /// First record (by URL) of a collection with the given slug.
    async fn find_by_slug(
        &self,
        collection: Collection,
        slug: &str,
    ) -> SyncResult<Option<IngredientRecord>>;

    async fn count_records(&self, collection: Collection) -> SyncResult<u64>;

    /// Record at `offset` under URL ordering.
    async fn record_at(
        &self,
        collection: Collection,
        offset: u64,
    ) -> SyncResult<Option<IngredientRecord>>;

    async fn get_composite(&self, url: &str) -> SyncResult<Option<CompositeRecipe>>;

    /// Set one category slot of the full taco at `composite_url`.
    async fn set_component(
        &self,
        composite_url: &str,
        category: Category,
        ingredient_url: &str,
    ) -> SyncResult<()>;

    async fn get_contributor(&self, username: &str) -> SyncResult<Option<Contributor>>;

    async fn insert_contributor(&self, contributor: &Contributor) -> SyncResult<()>;

    /// Associate a contributor with a record. Returns `false` if already associated.
    async fn add_contribution(
        &self,
        username: &str,
        collection: Collection,
        url: &str,
    ) -> SyncResult<bool>;

    /// Contributors associated with a record, ordered by username.
    async fn contributors_of(&self, collection: Collection, url: &str)
        -> SyncResult<Vec<Contributor>>;

    async fn get_checkpoint(&self, sync_kind: &str) -> SyncResult<Option<SyncCheckpoint>>;

    async fn put_checkpoint(&self, checkpoint: &SyncCheckpoint) -> SyncResult<()>;

    /// Make every write since the last commit durable.
    async fn commit(&self) -> SyncResult<()>;

    /// Discard every write since the last commit.
    async fn rollback(&self) -> SyncResult<()>;
}
