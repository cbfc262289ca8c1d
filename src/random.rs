//! `taco random`: draw a random record, or a whole random taco.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use tacofancy_core::models::{Category, Collection};
use tacofancy_core::sample::{fetch_random, fetch_random_taco};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

pub async fn run_random(config: &Config, collection: Option<Collection>, json: bool) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let mut rng = StdRng::from_os_rng();

    match collection {
        Some(collection) => {
            let result = fetch_random(&store, collection, &mut rng).await;
            store.close().await;
            match result? {
                Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
                Some(record) => println!("{}\t{}", record.slug, record.name),
                None => eprintln!("{} is empty. Run `taco preheat` first.", collection),
            }
        }
        None => {
            let result = fetch_random_taco(&store, &mut rng).await;
            store.close().await;
            let taco = result?;
            if json {
                println!("{}", serde_json::to_string_pretty(&taco)?);
                return Ok(());
            }
            for category in Category::ALL {
                let pick = taco
                    .get(category)
                    .map(|r| r.name.as_str())
                    .unwrap_or("(none)");
                println!("{:<12} {}", category.as_str(), pick);
            }
        }
    }
    Ok(())
}
