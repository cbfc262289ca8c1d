//! # tacofancy sync CLI (`taco`)
//!
//! The `taco` binary mirrors the tacofancy recipe repository into a local
//! SQLite database and answers read queries against it.
//!
//! ## Usage
//!
//! ```bash
//! taco --config ./config/taco.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `taco init` | Create the SQLite database and schema |
//! | `taco preheat` | Sync every recipe collection and link full tacos |
//! | `taco contributors [--full]` | Attribute contributors from commit history |
//! | `taco sync [--full]` | `preheat` followed by `contributors` |
//! | `taco list <collection>` | List slugs and names of a collection |
//! | `taco show <collection> <slug>` | Show one record with components and contributors |
//! | `taco random [<collection>]` | Random record, or a whole random taco |
//! | `taco stats` | Record counts and last sync |
//!
//! ## Examples
//!
//! ```bash
//! taco init
//! GITHUB_TOKEN=... taco sync
//! taco show full_tacos baja_fish_tacos --json
//! taco random
//! ```

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tacofancy_core::models::Collection;
use tacofancy_sync::progress::ProgressMode;
use tacofancy_sync::{config, contributors, get, ingest, migrate, random, stats};

/// tacofancy sync: mirror the tacofancy recipe repository into SQLite.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/taco.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "taco",
    about = "Mirror the tacofancy recipe repository into a local SQLite entity graph",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/taco.toml")]
    config: PathBuf,

    /// Progress on stderr: `off`, `human`, or `json`. Defaults to human on a TTY.
    #[arg(long, global = true)]
    progress: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all tables. Idempotent.
    Init,

    /// Sync every recipe collection, then link full tacos to their components.
    Preheat,

    /// Attribute contributors from commit history.
    ///
    /// Stops at the stored checkpoint unless `--full` is given.
    Contributors {
        /// Ignore the checkpoint and walk the whole history.
        #[arg(long)]
        full: bool,
    },

    /// Run `preheat` and then `contributors`.
    Sync {
        /// Ignore the contributor checkpoint.
        #[arg(long)]
        full: bool,
    },

    /// List the records of a collection.
    List {
        /// base_layers, condiments, mixins, seasonings, shells, or full_tacos.
        collection: Collection,
    },

    /// Show one record by slug.
    Show {
        collection: Collection,
        slug: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Draw a random record. Without a collection, draws one per category.
    Random {
        collection: Option<Collection>,

        #[arg(long)]
        json: bool,
    },

    /// Show record counts, contributors, and last sync.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let progress = match cli.progress.as_deref() {
        Some(value) => ProgressMode::parse(value)
            .ok_or_else(|| anyhow!("--progress must be off, human, or json (got '{}')", value))?,
        None => ProgressMode::default_for_tty(),
    };

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Preheat => {
            ingest::run_preheat(&cfg, progress).await?;
        }
        Commands::Contributors { full } => {
            contributors::run_contributors(&cfg, full, progress).await?;
        }
        Commands::Sync { full } => {
            ingest::run_preheat(&cfg, progress).await?;
            contributors::run_contributors(&cfg, full, progress).await?;
        }
        Commands::List { collection } => {
            get::run_list(&cfg, collection).await?;
        }
        Commands::Show {
            collection,
            slug,
            json,
        } => {
            get::run_show(&cfg, collection, &slug, json).await?;
        }
        Commands::Random { collection, json } => {
            random::run_random(&cfg, collection, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
