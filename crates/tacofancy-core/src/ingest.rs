//! Recipe ingestion: fetch → extract → upsert, then composite linking.
//!
//! Collections are processed in a fixed order (base layers, condiments,
//! seasonings, mixins, shells) before full tacos, because linking a full
//! taco needs its components to exist already. Each collection is one
//! store session, committed when the collection is done.
//!
//! Per-document failures are classified, not propagated:
//!
//! | Fetch result | Action |
//! |--------------|--------|
//! | content | extract, create or overwrite in place |
//! | `NotFound` | delete the stored record, if any |
//! | `Transient` | log and skip; stored record untouched |
//!
//! A [`SyncError::StoreFailure`] rolls back the open session and aborts.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::extract::extract;
use crate::fetch::DocumentFetcher;
use crate::links::resolve;
use crate::models::{Collection, IngredientRecord};
use crate::progress::{SyncProgressEvent, SyncProgressReporter};
use crate::source::{CollectionMap, RemoteSource};
use crate::store::EntityStore;

/// Everything a sync component needs, wired once at startup.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub fetcher: &'a dyn DocumentFetcher,
    pub store: &'a dyn EntityStore,
    pub remote: &'a RemoteSource,
    pub collections: &'a CollectionMap,
    pub progress: &'a dyn SyncProgressReporter,
}

/// Outcome of one collection pass.
#[derive(Debug, Clone)]
pub struct CategorySync {
    pub collection: Collection,
    /// Every record successfully fetched in this pass, stored or unchanged.
    pub upserted: Vec<IngredientRecord>,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    /// Documents left as-is after a transient fetch failure.
    pub skipped: u64,
}

impl CategorySync {
    fn new(collection: Collection) -> Self {
        Self {
            collection,
            upserted: Vec::new(),
            created: 0,
            updated: 0,
            deleted: 0,
            skipped: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSummary {
    pub composites: u64,
    /// Component slots set from a resolved link.
    pub linked: u64,
    /// Links whose target record does not exist.
    pub unresolved: u64,
}

#[derive(Debug, Clone)]
pub struct PreheatSummary {
    pub collections: Vec<CategorySync>,
    pub links: LinkSummary,
}

pub struct IngestionEngine<'a> {
    ctx: SyncContext<'a>,
}

impl<'a> IngestionEngine<'a> {
    pub fn new(ctx: SyncContext<'a>) -> Self {
        Self { ctx }
    }

    /// Full recipe pass: list once, sync every collection in order, link full tacos.
    pub async fn preheat(&self) -> SyncResult<PreheatSummary> {
        self.ctx.progress.report(SyncProgressEvent::Discovering);
        let tracked = self.ctx.fetcher.list_tracked_documents().await?;

        let mut collections = Vec::new();
        let mut composites = Vec::new();
        for collection in Collection::ALL {
            let Some(paths) = tracked.get(&collection) else {
                debug!(%collection, "collection not tracked, skipping");
                continue;
            };
            let outcome = self.sync_category(collection, paths).await?;
            info!(
                %collection,
                created = outcome.created,
                updated = outcome.updated,
                deleted = outcome.deleted,
                skipped = outcome.skipped,
                "collection synced"
            );
            if collection == Collection::FullTaco {
                composites = outcome.upserted.clone();
            }
            collections.push(outcome);
        }

        let links = self.link_composites(&composites).await?;
        info!(
            composites = links.composites,
            linked = links.linked,
            unresolved = links.unresolved,
            "full tacos linked"
        );
        Ok(PreheatSummary { collections, links })
    }

    /// Sync one collection from its listed document paths.
    ///
    /// Stored records whose documents are no longer listed are re-read too,
    /// so an upstream removal is confirmed by a `NotFound` before deletion.
    pub async fn sync_category(
        &self,
        collection: Collection,
        paths: &[String],
    ) -> SyncResult<CategorySync> {
        let mut outcome = CategorySync::new(collection);

        let result = async {
            let targets = self.reconcile_targets(collection, paths).await?;
            let total = targets.len() as u64;
            for (i, path) in targets.iter().enumerate() {
                self.sync_document(collection, path, &mut outcome).await?;
                self.ctx.progress.report(SyncProgressEvent::Ingesting {
                    collection,
                    n: i as u64 + 1,
                    total,
                });
            }
            self.ctx.store.commit().await
        }
        .await;

        match result {
            Ok(()) => Ok(outcome),
            Err(e) => Err(abort(self.ctx.store, e).await),
        }
    }

    /// Point each full taco's category slots at the records its body links to.
    ///
    /// Missing targets leave the slot as it was. Runs after every category
    /// of the current pass has been committed.
    pub async fn link_composites(&self, composites: &[IngredientRecord]) -> SyncResult<LinkSummary> {
        let mut summary = LinkSummary {
            composites: composites.len() as u64,
            ..Default::default()
        };
        let total = summary.composites;

        let result = async {
            for (i, composite) in composites.iter().enumerate() {
                if !composite.recipe.trim().is_empty() {
                    self.link_composite(composite, &mut summary).await?;
                }
                self.ctx.progress.report(SyncProgressEvent::Linking {
                    n: i as u64 + 1,
                    total,
                });
            }
            self.ctx.store.commit().await
        }
        .await;

        match result {
            Ok(()) => Ok(summary),
            Err(e) => Err(abort(self.ctx.store, e).await),
        }
    }

    async fn link_composite(
        &self,
        composite: &IngredientRecord,
        summary: &mut LinkSummary,
    ) -> SyncResult<()> {
        for link in resolve(&composite.recipe, self.ctx.remote, self.ctx.collections) {
            let target = self
                .ctx
                .store
                .get_record(link.category.into(), &link.url)
                .await?;
            if target.is_some() {
                self.ctx
                    .store
                    .set_component(&composite.url, link.category, &link.url)
                    .await?;
                summary.linked += 1;
            } else {
                debug!(composite = %composite.url, target = %link.url, "link target not stored");
                summary.unresolved += 1;
            }
        }
        Ok(())
    }

    /// Listed paths followed by stored-but-unlisted paths of the collection.
    async fn reconcile_targets(
        &self,
        collection: Collection,
        paths: &[String],
    ) -> SyncResult<Vec<String>> {
        let listed: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let mut targets = paths.to_vec();

        for record in self.ctx.store.list_records(collection).await? {
            match self.ctx.remote.path_of(&record.url) {
                Some(path) if !listed.contains(path) => targets.push(path.to_string()),
                Some(_) => {}
                None => warn!(url = %record.url, "stored record is outside the remote source"),
            }
        }
        Ok(targets)
    }

    async fn sync_document(
        &self,
        collection: Collection,
        path: &str,
        outcome: &mut CategorySync,
    ) -> SyncResult<()> {
        let url = self.ctx.remote.canonical_url(path);

        match self.ctx.fetcher.read_document(path).await {
            Ok(content) => {
                let record = extract(self.ctx.remote, path, &content);
                match self.ctx.store.get_record(collection, &url).await? {
                    Some(existing) if existing == record => {}
                    Some(_) => {
                        self.ctx.store.upsert_record(collection, &record).await?;
                        outcome.updated += 1;
                    }
                    None => {
                        self.ctx.store.upsert_record(collection, &record).await?;
                        outcome.created += 1;
                    }
                }
                outcome.upserted.push(record);
            }
            Err(SyncError::NotFound(_)) => {
                if self.ctx.store.delete_record(collection, &url).await? {
                    info!(%collection, %path, "removed upstream, deleted");
                    outcome.deleted += 1;
                }
            }
            Err(e) if e.is_transient() => {
                warn!(%collection, %path, error = %e, "fetch failed, keeping stored record");
                outcome.skipped += 1;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Roll back the open session and hand back the error that caused it.
pub(crate) async fn abort(store: &dyn EntityStore, err: SyncError) -> SyncError {
    if let Err(rollback_err) = store.rollback().await {
        warn!(error = %rollback_err, "rollback failed");
    }
    err
}
