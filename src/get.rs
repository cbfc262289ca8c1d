//! Read-side lookups: list a collection, show one record by slug.
//!
//! Used by the `taco list` and `taco show` commands.

use anyhow::{bail, Result};
use serde::Serialize;

use tacofancy_core::models::{Category, Collection, Contributor, IngredientRecord};
use tacofancy_core::store::EntityStore;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// A resolved component of a full taco.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentEntry {
    pub category: Category,
    pub name: String,
    pub slug: String,
    pub url: String,
}

/// One record with everything known about it.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub collection: String,
    #[serde(flatten)]
    pub record: IngredientRecord,
    /// Only present for full tacos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ComponentEntry>>,
    pub contributors: Vec<Contributor>,
}

pub async fn list_collection(config: &Config, collection: Collection) -> Result<Vec<IngredientRecord>> {
    let store = SqliteStore::open(config).await?;
    let result = store.list_records(collection).await;
    store.close().await;
    Ok(result?)
}

pub async fn lookup(store: &dyn EntityStore, collection: Collection, slug: &str) -> Result<Option<RecipeView>> {
    let Some(record) = store.find_by_slug(collection, slug).await? else {
        return Ok(None);
    };

    let components = match collection {
        Collection::FullTaco => {
            let mut entries = Vec::new();
            if let Some(composite) = store.get_composite(&record.url).await? {
                for category in Category::ALL {
                    let Some(url) = composite.components.get(category) else {
                        continue;
                    };
                    if let Some(target) = store.get_record(category.into(), url).await? {
                        entries.push(ComponentEntry {
                            category,
                            name: target.name,
                            slug: target.slug,
                            url: target.url,
                        });
                    }
                }
            }
            Some(entries)
        }
        Collection::Category(_) => None,
    };

    let contributors = store.contributors_of(collection, &record.url).await?;
    Ok(Some(RecipeView {
        collection: collection.as_str().to_string(),
        record,
        components,
        contributors,
    }))
}

pub async fn get_recipe(config: &Config, collection: Collection, slug: &str) -> Result<RecipeView> {
    let store = SqliteStore::open(config).await?;
    let result = lookup(&store, collection, slug).await;
    store.close().await;
    match result? {
        Some(view) => Ok(view),
        None => bail!("no {} with slug '{}'", collection, slug),
    }
}

/// CLI entry point for `taco list`.
pub async fn run_list(config: &Config, collection: Collection) -> Result<()> {
    let records = list_collection(config, collection).await?;
    for record in &records {
        println!("{}\t{}", record.slug, record.name);
    }
    if records.is_empty() {
        eprintln!("{} is empty. Run `taco preheat` first.", collection);
    }
    Ok(())
}

/// CLI entry point for `taco show`.
pub async fn run_show(config: &Config, collection: Collection, slug: &str, json: bool) -> Result<()> {
    let view = get_recipe(config, collection, slug).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("--- {} ---", view.record.name);
    println!("collection:   {}", view.collection);
    println!("slug:         {}", view.record.slug);
    println!("url:          {}", view.record.url);
    if let Some(components) = &view.components {
        println!("components:   {}", components.len());
        for c in components {
            println!("  {:<12} {} ({})", c.category.as_str(), c.name, c.slug);
        }
    }
    if !view.contributors.is_empty() {
        let names: Vec<&str> = view
            .contributors
            .iter()
            .map(|c| c.display_name.as_str())
            .collect();
        println!("contributors: {}", names.join(", "));
    }
    println!();
    println!("{}", view.record.recipe);
    Ok(())
}
