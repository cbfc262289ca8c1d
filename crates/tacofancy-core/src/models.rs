//! Core data models for the recipe graph.
//!
//! Five ingredient categories and the composite "full taco" collection
//! share one record shape ([`IngredientRecord`]). Full tacos additionally
//! carry one optional foreign key per category ([`ComponentLinks`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One of the five ingredient kinds a full taco is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BaseLayer,
    Condiment,
    Mixin,
    Seasoning,
    Shell,
}

impl Category {
    /// Ingestion order. Composite linking runs after all of these.
    pub const ALL: [Category; 5] = [
        Category::BaseLayer,
        Category::Condiment,
        Category::Seasoning,
        Category::Mixin,
        Category::Shell,
    ];

    /// Directory and collection name in the upstream repository.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BaseLayer => "base_layers",
            Category::Condiment => "condiments",
            Category::Mixin => "mixins",
            Category::Seasoning => "seasonings",
            Category::Shell => "shells",
        }
    }

    /// Column on the full taco table holding this category's foreign key.
    pub fn link_column(&self) -> &'static str {
        match self {
            Category::BaseLayer => "base_layer_url",
            Category::Condiment => "condiment_url",
            Category::Mixin => "mixin_url",
            Category::Seasoning => "seasoning_url",
            Category::Shell => "shell_url",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored collection: one per ingredient category plus full tacos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Category(Category),
    FullTaco,
}

impl Collection {
    /// Every collection in ingestion order, full tacos last.
    pub const ALL: [Collection; 6] = [
        Collection::Category(Category::BaseLayer),
        Collection::Category(Category::Condiment),
        Collection::Category(Category::Seasoning),
        Collection::Category(Category::Mixin),
        Collection::Category(Category::Shell),
        Collection::FullTaco,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Category(category) => category.as_str(),
            Collection::FullTaco => "full_tacos",
        }
    }

    /// SQL table backing this collection.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Category(Category::BaseLayer) => "base_layer",
            Collection::Category(Category::Condiment) => "condiment",
            Collection::Category(Category::Mixin) => "mixin",
            Collection::Category(Category::Seasoning) => "seasoning",
            Collection::Category(Category::Shell) => "shell",
            Collection::FullTaco => "full_taco",
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Collection::Category(category) => Some(*category),
            Collection::FullTaco => None,
        }
    }
}

impl From<Category> for Collection {
    fn from(category: Category) -> Self {
        Collection::Category(category)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown collection '{}'. Available: {}",
                    s,
                    Collection::ALL
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// The record shape shared by all six collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientRecord {
    /// Canonical raw-content URL; primary key.
    pub url: String,
    pub name: String,
    pub slug: String,
    /// Raw markdown body.
    pub recipe: String,
}

/// Foreign keys from a full taco to at most one record per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentLinks {
    pub base_layer: Option<String>,
    pub condiment: Option<String>,
    pub mixin: Option<String>,
    pub seasoning: Option<String>,
    pub shell: Option<String>,
}

impl ComponentLinks {
    pub fn get(&self, category: Category) -> Option<&str> {
        match category {
            Category::BaseLayer => self.base_layer.as_deref(),
            Category::Condiment => self.condiment.as_deref(),
            Category::Mixin => self.mixin.as_deref(),
            Category::Seasoning => self.seasoning.as_deref(),
            Category::Shell => self.shell.as_deref(),
        }
    }

    pub fn set(&mut self, category: Category, url: Option<String>) {
        let slot = match category {
            Category::BaseLayer => &mut self.base_layer,
            Category::Condiment => &mut self.condiment,
            Category::Mixin => &mut self.mixin,
            Category::Seasoning => &mut self.seasoning,
            Category::Shell => &mut self.shell,
        };
        *slot = url;
    }

    /// Unset every slot currently pointing at `url`. Returns how many changed.
    pub fn clear_target(&mut self, url: &str) -> usize {
        let mut cleared = 0;
        for category in Category::ALL {
            if self.get(category) == Some(url) {
                self.set(category, None);
                cleared += 1;
            }
        }
        cleared
    }

    pub fn is_complete(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_some())
    }
}

/// A full taco: an ingredient-shaped record plus its component links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeRecipe {
    #[serde(flatten)]
    pub record: IngredientRecord,
    pub components: ComponentLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Resume point for one kind of history walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCheckpoint {
    pub sync_kind: String,
    pub last_commit_id: Option<String>,
    pub last_sync_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_round_trips_through_str() {
        for collection in Collection::ALL {
            assert_eq!(collection.as_str().parse::<Collection>(), Ok(collection));
        }
        assert!("tortas".parse::<Collection>().is_err());
    }

    #[test]
    fn component_slots_are_dispatched_by_category() {
        let mut links = ComponentLinks::default();
        links.set(Category::Condiment, Some("c".to_string()));
        links.set(Category::Shell, Some("s".to_string()));

        assert_eq!(links.get(Category::Condiment), Some("c"));
        assert_eq!(links.get(Category::Shell), Some("s"));
        assert_eq!(links.get(Category::BaseLayer), None);
        assert!(!links.is_complete());
    }

    #[test]
    fn clear_target_unsets_matching_slots_only() {
        let mut links = ComponentLinks {
            condiment: Some("x".to_string()),
            mixin: Some("y".to_string()),
            ..Default::default()
        };
        assert_eq!(links.clear_target("x"), 1);
        assert_eq!(links.condiment, None);
        assert_eq!(links.mixin.as_deref(), Some("y"));
    }
}
