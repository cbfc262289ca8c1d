//! GitHub-backed [`DocumentFetcher`].
//!
//! Raw documents are read from `raw_base` at the canonical URL; the tree
//! listing and commit history come from the REST API at `api_base`.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list tracked documents | `GET {api}/repos/{o}/{r}/git/trees/{branch}?recursive=1` |
//! | read document | `GET {raw}/{o}/{r}/{branch}/{path}` |
//! | commit page | `GET {api}/repos/{o}/{r}/commits?sha={branch}&per_page=N&page=P` |
//! | commit files | `GET {api}/repos/{o}/{r}/commits/{sha}` |
//!
//! Only a 404 is reported as [`SyncError::NotFound`]. Rate limiting (403 or
//! 429), server errors, and network failures are [`SyncError::Transient`].
//! Nothing is retried here; the next sync pass picks skipped items up.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use tacofancy_core::fetch::{CommitAuthor, CommitDescriptor, CommitPage, DocumentFetcher};
use tacofancy_core::source::{bucket_tracked_documents, CollectionMap, RemoteSource, TrackedDocuments};
use tacofancy_core::{SyncError, SyncResult};

use crate::config::RemoteConfig;

pub struct GitHubFetcher {
    client: reqwest::Client,
    remote: RemoteSource,
    collections: CollectionMap,
    api_base: String,
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
    commit: GitCommit,
    /// Linked platform account; `null` when the author email is unlinked.
    author: Option<PlatformUser>,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    author: Option<GitIdentity>,
}

#[derive(Debug, Deserialize)]
struct GitIdentity {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlatformUser {
    login: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    files: Vec<CommitFile>,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    filename: String,
}

impl From<CommitSummary> for CommitDescriptor {
    fn from(summary: CommitSummary) -> Self {
        let (name, email) = match summary.commit.author {
            Some(identity) => (identity.name, identity.email),
            None => (None, None),
        };
        let (login, avatar_url) = match summary.author {
            Some(user) => (user.login, user.avatar_url),
            None => (None, None),
        };
        CommitDescriptor {
            id: summary.sha,
            author: CommitAuthor {
                login,
                avatar_url,
                name,
                email,
            },
        }
    }
}

impl GitHubFetcher {
    pub fn new(config: &RemoteConfig, collections: CollectionMap) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("tacofancy-sync/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = config.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            debug!("no GitHub token configured, using anonymous access");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            remote: config.source(),
            collections,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            per_page: config.per_page,
        })
    }

    fn repo_api(&self, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.remote.owner, self.remote.repo, rest
        )
    }

    /// Send a GET and classify the status.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> SyncResult<Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SyncError::transient(url, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::NOT_FOUND => Err(SyncError::NotFound(url.to_string())),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                let remaining = response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("?")
                    .to_string();
                Err(SyncError::transient(
                    url,
                    format!("HTTP {} (rate limit remaining: {})", status, remaining),
                ))
            }
            _ => Err(SyncError::transient(url, format!("HTTP {}", status))),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> SyncResult<(T, HeaderMap)> {
        let response = self.get(url, query).await?;
        let headers = response.headers().clone();
        let body = response
            .json::<T>()
            .await
            .map_err(|e| SyncError::transient(url, format!("invalid response body: {}", e)))?;
        Ok((body, headers))
    }
}

/// Whether a `Link` response header advertises a next page.
fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|part| part.contains("rel=\"next\""))
}

#[async_trait]
impl DocumentFetcher for GitHubFetcher {
    async fn list_tracked_documents(&self) -> SyncResult<TrackedDocuments> {
        let url = self.repo_api(&format!("git/trees/{}", self.remote.branch));
        let (tree, _) = self
            .get_json::<TreeResponse>(&url, &[("recursive", "1".to_string())])
            .await?;
        if tree.truncated {
            warn!("tree listing truncated by the API; some documents may be missing");
        }
        let blobs = tree
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob")
            .map(|e| e.path);
        let tracked = bucket_tracked_documents(blobs, &self.collections);
        debug!(
            documents = tracked.values().map(Vec::len).sum::<usize>(),
            "tree listed"
        );
        Ok(tracked)
    }

    async fn read_document(&self, path: &str) -> SyncResult<String> {
        let url = self.remote.canonical_url(path);
        let response = self.get(&url, &[]).await?;
        response
            .text()
            .await
            .map_err(|e| SyncError::transient(&url, e))
    }

    async fn commit_page(&self, page: u32) -> SyncResult<CommitPage> {
        let url = self.repo_api("commits");
        let query = [
            ("sha", self.remote.branch.clone()),
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ];
        let (commits, headers) = self.get_json::<Vec<CommitSummary>>(&url, &query).await?;
        debug!(page, commits = commits.len(), "commit page fetched");
        Ok(CommitPage {
            has_next: has_next_page(&headers),
            commits: commits.into_iter().map(CommitDescriptor::from).collect(),
        })
    }

    async fn commit_files(&self, commit_id: &str) -> SyncResult<Vec<String>> {
        let url = self.repo_api(&format!("commits/{}", commit_id));
        let (detail, _) = self.get_json::<CommitDetail>(&url, &[]).await?;
        Ok(detail.files.into_iter().map(|f| f.filename).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_detected_from_link_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://api.github.com/x?page=2>; rel=\"next\", <https://api.github.com/x?page=9>; rel=\"last\"",
            ),
        );
        assert!(has_next_page(&headers));
    }

    #[test]
    fn last_page_has_no_next() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static("<https://api.github.com/x?page=1>; rel=\"first\""),
        );
        assert!(!has_next_page(&headers));
        assert!(!has_next_page(&HeaderMap::new()));
    }

    #[test]
    fn unlinked_author_keeps_raw_identity() {
        let summary: CommitSummary = serde_json::from_str(
            r#"{"sha":"abc","commit":{"author":{"name":"Jane Doe","email":"j@x.org"}},"author":null}"#,
        )
        .unwrap();
        let descriptor = CommitDescriptor::from(summary);
        assert_eq!(descriptor.id, "abc");
        assert_eq!(descriptor.author.login, None);
        assert_eq!(descriptor.author.name.as_deref(), Some("Jane Doe"));
    }
}
