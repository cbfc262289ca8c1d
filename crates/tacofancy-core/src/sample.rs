//! Uniform random sampling over stored records.
//!
//! Sampling is count-then-offset: draw an index in `[0, count)` and read the
//! record at that position under URL ordering. Callers pass the RNG so tests
//! can seed it.

use rand::Rng;
use serde::Serialize;

use crate::error::SyncResult;
use crate::models::{Category, Collection, IngredientRecord};
use crate::store::EntityStore;

/// One random record per ingredient category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RandomTaco {
    pub base_layer: Option<IngredientRecord>,
    pub condiment: Option<IngredientRecord>,
    pub mixin: Option<IngredientRecord>,
    pub seasoning: Option<IngredientRecord>,
    pub shell: Option<IngredientRecord>,
}

impl RandomTaco {
    pub fn get(&self, category: Category) -> Option<&IngredientRecord> {
        match category {
            Category::BaseLayer => self.base_layer.as_ref(),
            Category::Condiment => self.condiment.as_ref(),
            Category::Mixin => self.mixin.as_ref(),
            Category::Seasoning => self.seasoning.as_ref(),
            Category::Shell => self.shell.as_ref(),
        }
    }

    fn slot(&mut self, category: Category) -> &mut Option<IngredientRecord> {
        match category {
            Category::BaseLayer => &mut self.base_layer,
            Category::Condiment => &mut self.condiment,
            Category::Mixin => &mut self.mixin,
            Category::Seasoning => &mut self.seasoning,
            Category::Shell => &mut self.shell,
        }
    }
}

/// A uniformly drawn record of `collection`, or `None` when it is empty.
pub async fn fetch_random<R>(
    store: &dyn EntityStore,
    collection: Collection,
    rng: &mut R,
) -> SyncResult<Option<IngredientRecord>>
where
    R: Rng + Send + ?Sized,
{
    let count = store.count_records(collection).await?;
    if count == 0 {
        return Ok(None);
    }
    let offset = rng.random_range(0..count);
    store.record_at(collection, offset).await
}

/// Draw one record from each ingredient category. Empty categories stay `None`.
pub async fn fetch_random_taco<R>(store: &dyn EntityStore, rng: &mut R) -> SyncResult<RandomTaco>
where
    R: Rng + Send + ?Sized,
{
    let mut taco = RandomTaco::default();
    for category in Category::ALL {
        *taco.slot(category) = fetch_random(store, category.into(), rng).await?;
    }
    Ok(taco)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::store::memory::InMemoryStore;

    fn record(url: &str) -> IngredientRecord {
        IngredientRecord {
            url: url.to_string(),
            name: url.to_string(),
            slug: url.to_string(),
            recipe: String::new(),
        }
    }

    const SHELLS: Collection = Collection::Category(Category::Shell);

    #[tokio::test]
    async fn empty_collection_yields_none() {
        let store = InMemoryStore::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(fetch_random(&store, SHELLS, &mut rng).await.unwrap(), None);
    }

    #[tokio::test]
    async fn single_record_is_always_drawn() {
        let store = InMemoryStore::new();
        store.upsert_record(SHELLS, &record("corn")).await.unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let drawn = fetch_random(&store, SHELLS, &mut rng).await.unwrap();
            assert_eq!(drawn.unwrap().url, "corn");
        }
    }

    #[tokio::test]
    async fn every_record_is_reachable() {
        let store = InMemoryStore::new();
        for url in ["corn", "flour", "lettuce"] {
            store.upsert_record(SHELLS, &record(url)).await.unwrap();
        }
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            seen.insert(fetch_random(&store, SHELLS, &mut rng).await.unwrap().unwrap().url);
        }
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn random_taco_leaves_empty_categories_unset() {
        let store = InMemoryStore::new();
        store.upsert_record(SHELLS, &record("corn")).await.unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let taco = fetch_random_taco(&store, &mut rng).await.unwrap();
        assert_eq!(taco.get(Category::Shell).map(|r| r.url.as_str()), Some("corn"));
        assert!(taco.base_layer.is_none());
        assert!(taco.condiment.is_none());
    }
}
