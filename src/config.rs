//! Configuration parsing and validation.
//!
//! `taco` is configured via a TOML file (default: `config/taco.toml`).
//! See `config/taco.example.toml` for a complete example.
//!
//! # Sections
//!
//! | Section | Purpose |
//! |---------|---------|
//! | `[db]` | SQLite database path |
//! | `[remote]` | Recipe repository coordinates and GitHub API access |
//! | `[sync]` | Attribution batching |
//!
//! Changing any `[remote]` coordinate changes every canonical URL, which
//! are the stored primary keys. Re-run a full sync against a fresh database
//! after doing so.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tacofancy_core::attribute::DEFAULT_COMMIT_BATCH_SIZE;
use tacofancy_core::source::RemoteSource;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_raw_base")]
    pub raw_base: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Name of the environment variable holding a GitHub token.
    /// Anonymous access when unset or empty.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Commits requested per history page (GitHub caps this at 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_branch() -> String {
    "master".to_string()
}
fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".to_string()
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_per_page() -> u32 {
    100
}

impl RemoteConfig {
    pub fn source(&self) -> RemoteSource {
        RemoteSource::new(&self.raw_base, &self.owner, &self.repo, &self.branch)
    }

    /// Token from the configured environment variable, if set and non-empty.
    pub fn token(&self) -> Option<String> {
        if self.token_env.is_empty() {
            return None;
        }
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_commit_batch_size")]
    pub commit_batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            commit_batch_size: DEFAULT_COMMIT_BATCH_SIZE,
        }
    }
}

fn default_commit_batch_size() -> usize {
    DEFAULT_COMMIT_BATCH_SIZE
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate remote
    for (field, value) in [
        ("owner", &config.remote.owner),
        ("repo", &config.remote.repo),
        ("branch", &config.remote.branch),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("remote.{} must not be empty", field);
        }
    }

    for (field, value) in [
        ("raw_base", &config.remote.raw_base),
        ("api_base", &config.remote.api_base),
    ] {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            anyhow::bail!("remote.{} must be an http(s) URL, got '{}'", field, value);
        }
    }

    if !(1..=100).contains(&config.remote.per_page) {
        anyhow::bail!("remote.per_page must be in [1, 100]");
    }

    if config.remote.timeout_secs == 0 {
        anyhow::bail!("remote.timeout_secs must be >= 1");
    }

    // Validate sync
    if config.sync.commit_batch_size == 0 {
        anyhow::bail!("sync.commit_batch_size must be >= 1");
    }

    Ok(config)
}
