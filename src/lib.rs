//! # tacofancy sync
//!
//! Mirrors the [tacofancy](https://github.com/dansinker/tacofancy) recipe
//! repository into a normalized SQLite entity graph: five ingredient
//! categories, full tacos linked to one ingredient per category, and the
//! contributors who wrote each recipe.
//!
//! The pipeline logic lives in `tacofancy-core`; this crate supplies the
//! SQLite store, the GitHub fetcher, configuration, and the `taco` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────┐
//! │   GitHub    │──▶│ IngestionEngine  │──▶│  SQLite  │
//! │ tree / raw  │   │ extract + link   │   │  graph   │
//! │  commits    │──▶│ Attributor       │──▶│          │
//! └─────────────┘   └──────────────────┘   └────┬─────┘
//!                                               │
//!                                         ┌─────▼─────┐
//!                                         │ taco list │
//!                                         │ show/rand │
//!                                         └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! taco init              # create database
//! taco sync              # recipes, then contributors
//! taco random            # a random taco
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | `EntityStore` over SQLite |
//! | [`github`] | `DocumentFetcher` over the GitHub API |
//! | [`ingest`] | `taco preheat` |
//! | [`contributors`] | `taco contributors` |
//! | [`get`] | `taco list`, `taco show` |
//! | [`random`] | `taco random` |
//! | [`stats`] | `taco stats` |
//! | [`progress`] | Progress rendering on stderr |

pub mod config;
pub mod contributors;
pub mod db;
pub mod get;
pub mod github;
pub mod ingest;
pub mod migrate;
pub mod progress;
pub mod random;
pub mod sqlite_store;
pub mod stats;
