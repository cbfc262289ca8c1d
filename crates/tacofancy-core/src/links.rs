//! Cross-document link resolution for full taco bodies.
//!
//! A full taco references its components with ordinary markdown links such
//! as `[Salsa](../condiments/salsa.md)` or absolute GitHub URLs. Each target
//! is reduced to its last two path segments (`condiments/salsa.md`) and
//! rebuilt into the same canonical URL the extractor produces for that
//! document, so it can be looked up by primary key.

use pulldown_cmark::{Event, Parser, Tag};
use tracing::debug;
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::models::Category;
use crate::source::{CollectionMap, RemoteSource, MARKDOWN_EXT};

/// One resolved component reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub category: Category,
    pub url: String,
}

/// Resolve every markdown link in `body` that points at a known category.
///
/// Links to other documents (unknown directories, other full tacos) are
/// skipped. Each target appears once, in first-seen order.
pub fn resolve(body: &str, remote: &RemoteSource, collections: &CollectionMap) -> Vec<ResolvedLink> {
    let mut resolved: Vec<ResolvedLink> = Vec::new();

    for href in markdown_link_targets(body) {
        match resolve_target(&href, remote, collections) {
            Ok(Some(link)) => {
                if !resolved.contains(&link) {
                    resolved.push(link);
                }
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "skipping link"),
        }
    }
    resolved
}

/// Destinations of all inline and reference links in a markdown body.
pub fn markdown_link_targets(body: &str) -> Vec<String> {
    Parser::new(body)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}

/// Map a single link target to a component reference.
///
/// Returns `Ok(None)` for targets that are not markdown documents and
/// [`SyncError::MalformedReference`] for markdown targets whose directory is
/// not a known category.
pub fn resolve_target(
    href: &str,
    remote: &RemoteSource,
    collections: &CollectionMap,
) -> SyncResult<Option<ResolvedLink>> {
    let path = link_path(href);
    if !path.ends_with(MARKDOWN_EXT) {
        return Ok(None);
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if segments.len() < 2 {
        return Err(SyncError::MalformedReference(href.to_string()));
    }
    let dir = segments[segments.len() - 2];
    let file = segments[segments.len() - 1];

    let category = collections
        .category_for_dir(dir)
        .ok_or_else(|| SyncError::MalformedReference(href.to_string()))?;

    Ok(Some(ResolvedLink {
        category,
        url: remote.canonical_url(&format!("{}/{}", dir, file)),
    }))
}

/// Path component of an absolute or relative link, without query or fragment.
fn link_path(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Collection;

    fn remote() -> RemoteSource {
        RemoteSource::new("https://raw.example.com", "dansinker", "tacofancy", "master")
    }

    #[test]
    fn resolves_relative_links_to_canonical_urls() {
        let body = "# Baja Fish Tacos\n\n* [Beer Battered Fish](../base_layers/beer_battered_fish.md)\n\
                    * [Salsa Verde](condiments/salsa_verde.md)\n";
        let links = resolve(body, &remote(), &CollectionMap::standard());
        assert_eq!(
            links,
            vec![
                ResolvedLink {
                    category: Category::BaseLayer,
                    url: "https://raw.example.com/dansinker/tacofancy/master/base_layers/beer_battered_fish.md".to_string(),
                },
                ResolvedLink {
                    category: Category::Condiment,
                    url: "https://raw.example.com/dansinker/tacofancy/master/condiments/salsa_verde.md".to_string(),
                },
            ]
        );
    }

    #[test]
    fn absolute_urls_are_reduced_to_their_path() {
        let body = "[Corn](https://github.com/dansinker/tacofancy/blob/master/shells/corn_tortillas.md#top)";
        let links = resolve(body, &remote(), &CollectionMap::standard());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].category, Category::Shell);
        assert!(links[0].url.ends_with("/master/shells/corn_tortillas.md"));
    }

    #[test]
    fn unknown_categories_and_non_markdown_targets_are_skipped() {
        let body = "[Tortas](like_tacos/tortas.md) [Photo](images/taco.jpg) \
                    [Other taco](full_tacos/al_pastor.md) [Bare](salsa.md)";
        assert!(resolve(body, &remote(), &CollectionMap::standard()).is_empty());
    }

    #[test]
    fn unknown_category_surfaces_as_malformed_reference() {
        let err = resolve_target("like_tacos/tortas.md", &remote(), &CollectionMap::standard())
            .unwrap_err();
        assert!(matches!(err, SyncError::MalformedReference(_)));
    }

    #[test]
    fn narrowed_collection_map_drops_categories() {
        let map = CollectionMap::new([("shells", Collection::Category(Category::Shell))]);
        let body = "[S](shells/flour.md) [C](condiments/salsa.md)";
        let links = resolve(body, &remote(), &map);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].category, Category::Shell);
    }

    #[test]
    fn duplicate_targets_are_reported_once() {
        let body = "[a](condiments/salsa.md) and again [b](./condiments/salsa.md)";
        assert_eq!(resolve(body, &remote(), &CollectionMap::standard()).len(), 1);
    }
}
