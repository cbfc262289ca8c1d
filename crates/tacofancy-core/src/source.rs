//! Remote repository coordinates and the directory → collection table.
//!
//! The canonical URL of a document (`<raw_base>/<owner>/<repo>/<branch>/<path>`)
//! is the primary key of every stored record. Changing any coordinate
//! invalidates all stored keys.

use std::collections::{BTreeMap, HashMap};

use crate::models::{Category, Collection};

/// Markdown extension tracked by the pipeline.
pub const MARKDOWN_EXT: &str = ".md";

/// File names that never hold a recipe, compared case-insensitively.
const NON_RECIPE_FILES: [&str; 3] = ["index.md", "readme.md", "license.md"];

/// Where the recipe repository lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub raw_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RemoteSource {
    pub fn new(
        raw_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            raw_base: raw_base.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }

    /// Prefix shared by every canonical URL, ending in `/`.
    pub fn url_prefix(&self) -> String {
        format!(
            "{}/{}/{}/{}/",
            self.raw_base, self.owner, self.repo, self.branch
        )
    }

    pub fn canonical_url(&self, path: &str) -> String {
        format!("{}{}", self.url_prefix(), path.trim_start_matches('/'))
    }

    /// Inverse of [`canonical_url`](Self::canonical_url), if `url` belongs to this source.
    pub fn path_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.url_prefix())
    }
}

/// Maps upstream directory names to stored collections.
///
/// Built once at startup and handed to every component, so the set of
/// recognised categories can be narrowed in tests.
#[derive(Debug, Clone)]
pub struct CollectionMap {
    by_dir: HashMap<String, Collection>,
}

impl CollectionMap {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Collection)>,
        S: Into<String>,
    {
        Self {
            by_dir: entries.into_iter().map(|(d, c)| (d.into(), c)).collect(),
        }
    }

    /// The upstream layout: each collection lives in the directory named after it.
    pub fn standard() -> Self {
        Self::new(Collection::ALL.iter().map(|c| (c.as_str(), *c)))
    }

    pub fn collection_for_dir(&self, dir: &str) -> Option<Collection> {
        self.by_dir.get(dir).copied()
    }

    /// Like [`collection_for_dir`](Self::collection_for_dir) but only ingredient categories.
    pub fn category_for_dir(&self, dir: &str) -> Option<Category> {
        self.collection_for_dir(dir).and_then(|c| c.category())
    }

    /// Collection of a repository path, from its top-level directory.
    pub fn collection_for_path(&self, path: &str) -> Option<Collection> {
        let mut parts = path.split('/');
        let top = parts.next()?;
        parts.next()?;
        self.collection_for_dir(top)
    }
}

impl Default for CollectionMap {
    fn default() -> Self {
        Self::standard()
    }
}

/// True for markdown files that can hold a recipe.
pub fn is_recipe_file(path: &str) -> bool {
    if !path.ends_with(MARKDOWN_EXT) {
        return false;
    }
    let file_name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    !NON_RECIPE_FILES.contains(&file_name.as_str())
}

/// Tracked document paths grouped by collection, each list sorted.
pub type TrackedDocuments = BTreeMap<Collection, Vec<String>>;

/// Bucket a repository file listing into collections.
///
/// Keeps markdown recipe files whose top-level directory is a known
/// collection; everything else is ignored. Every known collection gets an
/// entry, possibly empty.
pub fn bucket_tracked_documents<I, S>(paths: I, collections: &CollectionMap) -> TrackedDocuments
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tracked: TrackedDocuments = collections
        .by_dir
        .values()
        .map(|c| (*c, Vec::new()))
        .collect();

    for path in paths {
        let path = path.as_ref();
        if !is_recipe_file(path) {
            continue;
        }
        if let Some(collection) = collections.collection_for_path(path) {
            tracked.entry(collection).or_default().push(path.to_string());
        }
    }

    for docs in tracked.values_mut() {
        docs.sort();
        docs.dedup();
    }
    tracked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteSource {
        RemoteSource::new(
            "https://raw.githubusercontent.com/",
            "dansinker",
            "tacofancy",
            "master",
        )
    }

    #[test]
    fn canonical_url_is_deterministic() {
        let url = remote().canonical_url("condiments/salsa.md");
        assert_eq!(
            url,
            "https://raw.githubusercontent.com/dansinker/tacofancy/master/condiments/salsa.md"
        );
        assert_eq!(url, remote().canonical_url("/condiments/salsa.md"));
        assert_eq!(remote().path_of(&url), Some("condiments/salsa.md"));
        assert_eq!(remote().path_of("https://example.com/x.md"), None);
    }

    #[test]
    fn recipe_file_filter() {
        assert!(is_recipe_file("shells/corn_tortillas.md"));
        assert!(!is_recipe_file("shells/README.md"));
        assert!(!is_recipe_file("INDEX.md"));
        assert!(!is_recipe_file("shells/photo.jpg"));
        assert!(!is_recipe_file("LICENSE.md"));
        assert!(!is_recipe_file("condiments/License.md"));
    }

    #[test]
    fn bucketing_ignores_unknown_dirs_and_root_files() {
        let paths = [
            "README.md",
            "INDEX.md",
            "condiments/salsa.md",
            "condiments/guacamole.md",
            "condiments/README.md",
            "like_tacos/tortas.md",
            "full_tacos/baja_fish.md",
            "base_layers/carnitas.md",
            "base_layers/notes.txt",
        ];
        let tracked = bucket_tracked_documents(paths, &CollectionMap::standard());

        assert_eq!(tracked.len(), 6);
        assert_eq!(
            tracked[&Collection::Category(Category::Condiment)],
            vec!["condiments/guacamole.md", "condiments/salsa.md"]
        );
        assert_eq!(tracked[&Collection::FullTaco], vec!["full_tacos/baja_fish.md"]);
        assert!(tracked[&Collection::Category(Category::Shell)].is_empty());
    }

    #[test]
    fn narrowed_map_only_recognises_its_entries() {
        let map = CollectionMap::new([("shells", Collection::Category(Category::Shell))]);
        assert_eq!(map.category_for_dir("shells"), Some(Category::Shell));
        assert_eq!(map.category_for_dir("condiments"), None);
        assert_eq!(map.collection_for_path("shells"), None);
    }
}
