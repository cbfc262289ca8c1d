//! In-memory [`EntityStore`] implementation for tests and dry runs.
//!
//! Committed state and the open session are two copies of the same
//! [`State`]; the first write of a session clones the committed copy, and
//! `commit` swaps it in. This mirrors the transactional behaviour of the
//! SQLite store closely enough to test checkpoint and rollback semantics.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};
use crate::models::{
    Category, Collection, ComponentLinks, CompositeRecipe, Contributor, IngredientRecord,
    SyncCheckpoint,
};

use super::EntityStore;

#[derive(Debug, Clone, Default)]
struct State {
    records: HashMap<Collection, BTreeMap<String, IngredientRecord>>,
    components: HashMap<String, ComponentLinks>,
    contributors: BTreeMap<String, Contributor>,
    contributions: BTreeSet<(String, Collection, String)>,
    checkpoints: HashMap<String, SyncCheckpoint>,
}

impl State {
    fn collection(&self, collection: Collection) -> Option<&BTreeMap<String, IngredientRecord>> {
        self.records.get(&collection)
    }

    fn contains(&self, collection: Collection, url: &str) -> bool {
        self.collection(collection)
            .is_some_and(|records| records.contains_key(url))
    }
}

/// In-memory store with a single open session.
pub struct InMemoryStore {
    committed: RwLock<State>,
    session: Mutex<Option<State>>,
    write_budget: Mutex<Option<usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(State::default()),
            session: Mutex::new(None),
            write_budget: Mutex::new(None),
        }
    }

    /// Testing aid: allow `writes` more successful writes, then fail every
    /// write with [`SyncError::StoreFailure`].
    pub fn fail_writes_after(&self, writes: usize) {
        *self
            .write_budget
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(writes);
    }

    /// Whether a session with uncommitted writes is open.
    pub fn has_pending_writes(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        match session.as_ref() {
            Some(state) => f(state),
            None => f(&self.committed.read().unwrap_or_else(PoisonError::into_inner)),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut State) -> SyncResult<T>) -> SyncResult<T> {
        {
            let mut budget = self
                .write_budget
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(SyncError::store("injected write failure"));
                }
                *remaining -= 1;
            }
        }

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let state = session.get_or_insert_with(|| {
            self.committed
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        });
        f(state)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get_record(
        &self,
        collection: Collection,
        url: &str,
    ) -> SyncResult<Option<IngredientRecord>> {
        Ok(self.read(|s| s.collection(collection).and_then(|r| r.get(url)).cloned()))
    }

    async fn upsert_record(
        &self,
        collection: Collection,
        record: &IngredientRecord,
    ) -> SyncResult<()> {
        self.write(|s| {
            s.records
                .entry(collection)
                .or_default()
                .insert(record.url.clone(), record.clone());
            if collection == Collection::FullTaco {
                s.components.entry(record.url.clone()).or_default();
            }
            Ok(())
        })
    }

    async fn delete_record(&self, collection: Collection, url: &str) -> SyncResult<bool> {
        if !self.read(|s| s.contains(collection, url)) {
            return Ok(false);
        }
        self.write(|s| {
            if let Some(records) = s.records.get_mut(&collection) {
                records.remove(url);
            }
            s.contributions
                .retain(|(_, c, u)| !(*c == collection && u == url));
            match collection {
                Collection::FullTaco => {
                    s.components.remove(url);
                }
                Collection::Category(_) => {
                    for links in s.components.values_mut() {
                        links.clear_target(url);
                    }
                }
            }
            Ok(true)
        })
    }

    async fn list_records(&self, collection: Collection) -> SyncResult<Vec<IngredientRecord>> {
        Ok(self.read(|s| {
            s.collection(collection)
                .map(|r| r.values().cloned().collect())
                .unwrap_or_default()
        }))
    }

    async fn find_by_slug(
        &self,
        collection: Collection,
        slug: &str,
    ) -> SyncResult<Option<IngredientRecord>> {
        Ok(self.read(|s| {
            s.collection(collection)
                .and_then(|r| r.values().find(|rec| rec.slug == slug))
                .cloned()
        }))
    }

    async fn count_records(&self, collection: Collection) -> SyncResult<u64> {
        Ok(self.read(|s| s.collection(collection).map_or(0, |r| r.len() as u64)))
    }

    async fn record_at(
        &self,
        collection: Collection,
        offset: u64,
    ) -> SyncResult<Option<IngredientRecord>> {
        Ok(self.read(|s| {
            s.collection(collection)
                .and_then(|r| r.values().nth(offset as usize))
                .cloned()
        }))
    }

    async fn get_composite(&self, url: &str) -> SyncResult<Option<CompositeRecipe>> {
        Ok(self.read(|s| {
            let record = s.collection(Collection::FullTaco)?.get(url)?.clone();
            Some(CompositeRecipe {
                record,
                components: s.components.get(url).cloned().unwrap_or_default(),
            })
        }))
    }

    async fn set_component(
        &self,
        composite_url: &str,
        category: Category,
        ingredient_url: &str,
    ) -> SyncResult<()> {
        self.write(|s| {
            if !s.contains(Collection::FullTaco, composite_url) {
                return Err(SyncError::store(format!(
                    "no full taco stored at {}",
                    composite_url
                )));
            }
            if !s.contains(category.into(), ingredient_url) {
                return Err(SyncError::store(format!(
                    "no {} stored at {}",
                    category, ingredient_url
                )));
            }
            s.components
                .entry(composite_url.to_string())
                .or_default()
                .set(category, Some(ingredient_url.to_string()));
            Ok(())
        })
    }

    async fn get_contributor(&self, username: &str) -> SyncResult<Option<Contributor>> {
        Ok(self.read(|s| s.contributors.get(username).cloned()))
    }

    async fn insert_contributor(&self, contributor: &Contributor) -> SyncResult<()> {
        self.write(|s| {
            s.contributors
                .entry(contributor.username.clone())
                .or_insert_with(|| contributor.clone());
            Ok(())
        })
    }

    async fn add_contribution(
        &self,
        username: &str,
        collection: Collection,
        url: &str,
    ) -> SyncResult<bool> {
        self.write(|s| {
            if !s.contributors.contains_key(username) {
                return Err(SyncError::store(format!("unknown contributor {}", username)));
            }
            Ok(s
                .contributions
                .insert((username.to_string(), collection, url.to_string())))
        })
    }

    async fn contributors_of(
        &self,
        collection: Collection,
        url: &str,
    ) -> SyncResult<Vec<Contributor>> {
        Ok(self.read(|s| {
            s.contributions
                .iter()
                .filter(|(_, c, u)| *c == collection && u == url)
                .filter_map(|(name, _, _)| s.contributors.get(name).cloned())
                .collect()
        }))
    }

    async fn get_checkpoint(&self, sync_kind: &str) -> SyncResult<Option<SyncCheckpoint>> {
        Ok(self.read(|s| s.checkpoints.get(sync_kind).cloned()))
    }

    async fn put_checkpoint(&self, checkpoint: &SyncCheckpoint) -> SyncResult<()> {
        self.write(|s| {
            s.checkpoints
                .insert(checkpoint.sync_kind.clone(), checkpoint.clone());
            Ok(())
        })
    }

    async fn commit(&self) -> SyncResult<()> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = session.take() {
            *self.committed.write().unwrap_or_else(PoisonError::into_inner) = state;
        }
        Ok(())
    }

    async fn rollback(&self) -> SyncResult<()> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, name: &str) -> IngredientRecord {
        IngredientRecord {
            url: url.to_string(),
            name: name.to_string(),
            slug: crate::slug::slugify(name),
            recipe: format!("# {}", name),
        }
    }

    const SALSA: Collection = Collection::Category(Category::Condiment);

    #[tokio::test]
    async fn uncommitted_writes_are_visible_then_discarded_on_rollback() {
        let store = InMemoryStore::new();
        store.upsert_record(SALSA, &record("u1", "Salsa")).await.unwrap();
        assert!(store.get_record(SALSA, "u1").await.unwrap().is_some());
        assert!(store.has_pending_writes());

        store.rollback().await.unwrap();
        assert!(store.get_record(SALSA, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_makes_writes_durable() {
        let store = InMemoryStore::new();
        store.upsert_record(SALSA, &record("u1", "Salsa")).await.unwrap();
        store.commit().await.unwrap();
        store.rollback().await.unwrap();
        assert_eq!(store.count_records(SALSA).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_clears_component_slots_and_contributions() {
        let store = InMemoryStore::new();
        store.upsert_record(SALSA, &record("salsa", "Salsa")).await.unwrap();
        store
            .upsert_record(Collection::FullTaco, &record("taco", "Taco"))
            .await
            .unwrap();
        store
            .set_component("taco", Category::Condiment, "salsa")
            .await
            .unwrap();
        store
            .insert_contributor(&Contributor {
                username: "sinker".to_string(),
                display_name: "Dan Sinker".to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();
        assert!(store.add_contribution("sinker", SALSA, "salsa").await.unwrap());
        assert!(!store.add_contribution("sinker", SALSA, "salsa").await.unwrap());

        assert!(store.delete_record(SALSA, "salsa").await.unwrap());
        assert!(!store.delete_record(SALSA, "salsa").await.unwrap());

        let taco = store.get_composite("taco").await.unwrap().unwrap();
        assert_eq!(taco.components.condiment, None);
        assert!(store.contributors_of(SALSA, "salsa").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_surface_as_store_failure() {
        let store = InMemoryStore::new();
        store.fail_writes_after(1);
        store.upsert_record(SALSA, &record("a", "A")).await.unwrap();
        let err = store.upsert_record(SALSA, &record("b", "B")).await.unwrap_err();
        assert!(matches!(err, SyncError::StoreFailure(_)));
    }

    #[tokio::test]
    async fn offsets_follow_url_order() {
        let store = InMemoryStore::new();
        for url in ["c", "a", "b"] {
            store.upsert_record(SALSA, &record(url, url)).await.unwrap();
        }
        let urls: Vec<String> = urls_in_order(&store).await;
        assert_eq!(urls, vec!["a", "b", "c"]);
        assert_eq!(store.record_at(SALSA, 3).await.unwrap(), None);
    }

    async fn urls_in_order(store: &InMemoryStore) -> Vec<String> {
        let mut urls = Vec::new();
        for i in 0..store.count_records(SALSA).await.unwrap() {
            urls.push(store.record_at(SALSA, i).await.unwrap().unwrap().url);
        }
        urls
    }
}
