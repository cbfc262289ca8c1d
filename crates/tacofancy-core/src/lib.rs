//! # Tacofancy Core
//!
//! Storage- and transport-agnostic logic for the tacofancy ingestion
//! pipeline: data models, slug generation, recipe extraction, link
//! resolution, the [`EntityStore`](store::EntityStore) and
//! [`DocumentFetcher`](fetch::DocumentFetcher) boundaries, and the two
//! orchestrators built on top of them.
//!
//! This crate contains no sqlx, HTTP client, or filesystem I/O. The
//! `tacofancy-sync` crate plugs a SQLite store and a GitHub fetcher into
//! these traits.
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────┐
//! │ DocumentFetch│──▶│ IngestionEngine   │──▶│ EntityStore  │
//! │ (tree, raw,  │   │ extract + link    │   │ (upsert,     │
//! │  commits)    │──▶│ Attributor        │──▶│  checkpoint) │
//! └──────────────┘   └───────────────────┘   └──────────────┘
//! ```

pub mod attribute;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod links;
pub mod models;
pub mod progress;
pub mod sample;
pub mod slug;
pub mod source;
pub mod store;

pub use error::{SyncError, SyncResult};
