//! SQLite store tests against a throwaway database.

use std::fs;

use tacofancy_core::models::{Category, Collection, Contributor, IngredientRecord, SyncCheckpoint};
use tacofancy_core::store::EntityStore;
use tacofancy_sync::config::{load_config, Config};
use tacofancy_sync::migrate::run_migrations;
use tacofancy_sync::sqlite_store::SqliteStore;
use tempfile::TempDir;

const CONDIMENTS: Collection = Collection::Category(Category::Condiment);
const SHELLS: Collection = Collection::Category(Category::Shell);

async fn setup() -> (TempDir, Config, SqliteStore) {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("taco.toml");
    fs::write(
        &config_path,
        format!(
            r#"[db]
path = "{}/data/tacos.sqlite"

[remote]
owner = "dansinker"
repo = "tacofancy"
"#,
            tmp.path().display()
        ),
    )
    .unwrap();
    let config = load_config(&config_path).unwrap();
    run_migrations(&config).await.unwrap();
    let store = SqliteStore::open(&config).await.unwrap();
    (tmp, config, store)
}

fn record(url: &str, name: &str) -> IngredientRecord {
    IngredientRecord {
        url: url.to_string(),
        name: name.to_string(),
        slug: tacofancy_core::slug::slugify(name),
        recipe: format!("# {}\n", name),
    }
}

fn sinker() -> Contributor {
    Contributor {
        username: "sinker".to_string(),
        display_name: "Dan Sinker".to_string(),
        avatar_url: Some("https://avatars.example.com/sinker".to_string()),
    }
}

#[tokio::test]
async fn upsert_overwrites_in_place() {
    let (_tmp, _config, store) = setup().await;
    store.upsert_record(CONDIMENTS, &record("u/salsa", "Salsa")).await.unwrap();
    store
        .upsert_record(CONDIMENTS, &record("u/salsa", "Salsa Roja"))
        .await
        .unwrap();
    store.commit().await.unwrap();

    assert_eq!(store.count_records(CONDIMENTS).await.unwrap(), 1);
    let stored = store.get_record(CONDIMENTS, "u/salsa").await.unwrap().unwrap();
    assert_eq!(stored.slug, "salsa_roja");
    assert_eq!(
        store.find_by_slug(CONDIMENTS, "salsa_roja").await.unwrap(),
        Some(stored)
    );
    store.close().await;
}

#[tokio::test]
async fn rollback_discards_uncommitted_writes() {
    let (_tmp, config, store) = setup().await;
    store.upsert_record(SHELLS, &record("u/corn", "Corn")).await.unwrap();
    // Visible inside the session.
    assert_eq!(store.count_records(SHELLS).await.unwrap(), 1);
    store.rollback().await.unwrap();
    assert_eq!(store.count_records(SHELLS).await.unwrap(), 0);

    // Dropping the store without commit also discards.
    store.upsert_record(SHELLS, &record("u/corn", "Corn")).await.unwrap();
    store.close().await;
    let reopened = SqliteStore::open(&config).await.unwrap();
    assert_eq!(reopened.count_records(SHELLS).await.unwrap(), 0);
    reopened.close().await;
}

#[tokio::test]
async fn deleting_ingredient_clears_slot_and_contributions() {
    let (_tmp, _config, store) = setup().await;
    store.upsert_record(CONDIMENTS, &record("u/salsa", "Salsa")).await.unwrap();
    store
        .upsert_record(Collection::FullTaco, &record("u/taco", "Taco"))
        .await
        .unwrap();
    store
        .set_component("u/taco", Category::Condiment, "u/salsa")
        .await
        .unwrap();
    store.insert_contributor(&sinker()).await.unwrap();
    assert!(store.add_contribution("sinker", CONDIMENTS, "u/salsa").await.unwrap());
    assert!(!store.add_contribution("sinker", CONDIMENTS, "u/salsa").await.unwrap());
    store.commit().await.unwrap();

    assert!(store.delete_record(CONDIMENTS, "u/salsa").await.unwrap());
    assert!(!store.delete_record(CONDIMENTS, "u/salsa").await.unwrap());
    store.commit().await.unwrap();

    let taco = store.get_composite("u/taco").await.unwrap().unwrap();
    assert_eq!(taco.components.condiment, None);
    assert!(store.contributors_of(CONDIMENTS, "u/salsa").await.unwrap().is_empty());
    assert!(store.get_contributor("sinker").await.unwrap().is_some());
    store.close().await;
}

#[tokio::test]
async fn composite_upsert_keeps_links() {
    let (_tmp, _config, store) = setup().await;
    store.upsert_record(SHELLS, &record("u/corn", "Corn")).await.unwrap();
    store
        .upsert_record(Collection::FullTaco, &record("u/taco", "Taco"))
        .await
        .unwrap();
    store.set_component("u/taco", Category::Shell, "u/corn").await.unwrap();
    store
        .upsert_record(Collection::FullTaco, &record("u/taco", "Better Taco"))
        .await
        .unwrap();
    store.commit().await.unwrap();

    let taco = store.get_composite("u/taco").await.unwrap().unwrap();
    assert_eq!(taco.record.name, "Better Taco");
    assert_eq!(taco.components.get(Category::Shell), Some("u/corn"));
    store.close().await;
}

#[tokio::test]
async fn set_component_on_missing_taco_fails() {
    let (_tmp, _config, store) = setup().await;
    let err = store
        .set_component("u/nope", Category::Shell, "u/corn")
        .await
        .unwrap_err();
    assert!(matches!(err, tacofancy_core::SyncError::StoreFailure(_)));
    store.close().await;
}

#[tokio::test]
async fn record_offsets_follow_url_order() {
    let (_tmp, _config, store) = setup().await;
    for url in ["u/c", "u/a", "u/b"] {
        store.upsert_record(SHELLS, &record(url, url)).await.unwrap();
    }
    store.commit().await.unwrap();

    let mut urls = Vec::new();
    for offset in 0..3 {
        urls.push(store.record_at(SHELLS, offset).await.unwrap().unwrap().url);
    }
    assert_eq!(urls, vec!["u/a", "u/b", "u/c"]);
    assert_eq!(store.record_at(SHELLS, 3).await.unwrap(), None);
    let listed: Vec<String> = store
        .list_records(SHELLS)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert_eq!(listed, urls);
    store.close().await;
}

#[tokio::test]
async fn checkpoint_round_trips_and_overwrites() {
    let (_tmp, _config, store) = setup().await;
    assert!(store.get_checkpoint("contributors").await.unwrap().is_none());

    for sha in ["aaa", "bbb"] {
        store
            .put_checkpoint(&SyncCheckpoint {
                sync_kind: "contributors".to_string(),
                last_commit_id: Some(sha.to_string()),
                last_sync_time: chrono::Utc::now(),
            })
            .await
            .unwrap();
        store.commit().await.unwrap();
    }

    let cp = store.get_checkpoint("contributors").await.unwrap().unwrap();
    assert_eq!(cp.last_commit_id.as_deref(), Some("bbb"));
    store.close().await;
}
