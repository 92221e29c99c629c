//! GitHub REST transport.
//!
//! One push is a single commit holding the full snapshot: blobs, one tree
//! without a base tree, one commit on top of the branch head, then the branch
//! ref is force-moved to it.

use crate::error::SyncError;
use crate::sync::snapshot::ArchiveEntry;
use crate::sync::target::{GitCredentials, GitTransport, RepoHandle, Visibility};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Clone)]
pub struct GitHubTransport {
    client: Client,
    api_base_url: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    html_url: String,
    default_branch: Option<String>,
    owner: OwnerResponse,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaResponse,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

impl GitHubTransport {
    pub fn new(
        api_base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::NetworkFailure(e.to_string()))?;
        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn authed(&self, request: RequestBuilder, credentials: &GitCredentials) -> RequestBuilder {
        request
            .bearer_auth(&credentials.token)
            .header("Accept", ACCEPT)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, SyncError> {
        self.send_optional(request, context, &[])
            .await?
            .ok_or_else(|| SyncError::Transport(format!("{}: empty response", context)))
    }

    /// Like `send_json`, but statuses listed in `absent` yield `Ok(None)`
    async fn send_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
        absent: &[StatusCode],
    ) -> Result<Option<T>, SyncError> {
        let response = request.send().await.map_err(network_failure)?;
        let status = response.status();
        if absent.contains(&status) {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, context, &body));
        }
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| SyncError::Transport(format!("{}: malformed response: {}", context, e)))
    }

    async fn find_repo(
        &self,
        owner: &str,
        name: &str,
        credentials: &GitCredentials,
    ) -> Result<Option<RepoResponse>, SyncError> {
        let request = self.authed(
            self.client.get(self.url(&format!("/repos/{}/{}", owner, name))),
            credentials,
        );
        self.send_optional(request, "look up repository", &[StatusCode::NOT_FOUND])
            .await
    }

    async fn branch_head(
        &self,
        repo: &RepoHandle,
        credentials: &GitCredentials,
    ) -> Result<Option<String>, SyncError> {
        let path = format!(
            "/repos/{}/git/ref/heads/{}",
            repo.full_name(),
            repo.default_branch
        );
        let request = self.authed(self.client.get(self.url(&path)), credentials);
        // Empty repositories answer 404 or 409
        let head: Option<RefResponse> = self
            .send_optional(
                request,
                "read branch head",
                &[StatusCode::NOT_FOUND, StatusCode::CONFLICT],
            )
            .await?;
        Ok(head.map(|head| head.object.sha))
    }

    async fn create_blob(
        &self,
        repo: &RepoHandle,
        bytes: &[u8],
        is_binary: bool,
        credentials: &GitCredentials,
    ) -> Result<String, SyncError> {
        let body = match std::str::from_utf8(bytes) {
            Ok(text) if !is_binary => json!({ "content": text, "encoding": "utf-8" }),
            _ => json!({ "content": BASE64.encode(bytes), "encoding": "base64" }),
        };
        let path = format!("/repos/{}/git/blobs", repo.full_name());
        let request = self.authed(self.client.post(self.url(&path)), credentials).json(&body);
        let blob: ShaResponse = self.send_json(request, "create blob").await?;
        Ok(blob.sha)
    }
}

#[async_trait]
impl GitTransport for GitHubTransport {
    async fn ensure_repo(
        &self,
        name: &str,
        visibility: Visibility,
        credentials: &GitCredentials,
    ) -> Result<RepoHandle, SyncError> {
        let repo = match self.find_repo(&credentials.username, name, credentials).await? {
            Some(repo) => {
                debug!(repo = %repo.html_url, "Using existing repository");
                repo
            }
            None => {
                info!(name, %visibility, "Creating repository");
                let request = self
                    .authed(self.client.post(self.url("/user/repos")), credentials)
                    .json(&json!({
                        "name": name,
                        "private": visibility.is_private(),
                        "auto_init": true,
                    }));
                self.send_json::<RepoResponse>(request, "create repository").await?
            }
        };
        Ok(RepoHandle {
            owner: repo.owner.login,
            name: repo.name,
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
            html_url: repo.html_url,
        })
    }

    async fn commit_and_push(
        &self,
        repo: &RepoHandle,
        message: &str,
        entries: &[ArchiveEntry],
        credentials: &GitCredentials,
    ) -> Result<String, SyncError> {
        let parent = self.branch_head(repo, credentials).await?;

        // Git has no empty directories; folders are implied by their files
        let mut tree = Vec::new();
        for entry in entries {
            if let ArchiveEntry::File {
                path,
                bytes,
                is_binary,
            } = entry
            {
                let sha = self.create_blob(repo, bytes, *is_binary, credentials).await?;
                tree.push(json!({ "path": path, "mode": "100644", "type": "blob", "sha": sha }));
            }
        }
        debug!(repo = %repo.full_name(), blobs = tree.len(), "Uploaded blobs");

        let base = format!("/repos/{}/git", repo.full_name());
        let request = self
            .authed(self.client.post(self.url(&format!("{}/trees", base))), credentials)
            .json(&json!({ "tree": tree }));
        let tree: ShaResponse = self.send_json(request, "create tree").await?;

        let parents: Vec<&str> = parent.iter().map(String::as_str).collect();
        let request = self
            .authed(self.client.post(self.url(&format!("{}/commits", base))), credentials)
            .json(&json!({ "message": message, "tree": tree.sha, "parents": parents }));
        let commit: ShaResponse = self.send_json(request, "create commit").await?;

        let request = match parent {
            Some(_) => self
                .authed(
                    self.client.patch(
                        self.url(&format!("{}/refs/heads/{}", base, repo.default_branch)),
                    ),
                    credentials,
                )
                .json(&json!({ "sha": commit.sha, "force": true })),
            None => self
                .authed(self.client.post(self.url(&format!("{}/refs", base))), credentials)
                .json(&json!({
                    "ref": format!("refs/heads/{}", repo.default_branch),
                    "sha": commit.sha,
                })),
        };
        let _: serde_json::Value = self.send_json(request, "update branch").await?;

        info!(repo = %repo.full_name(), commit = %commit.sha, "Pushed snapshot");
        Ok(repo.html_url.clone())
    }
}

fn network_failure(err: reqwest::Error) -> SyncError {
    SyncError::NetworkFailure(err.to_string())
}

/// Map a non-success HTTP status to a sync error
pub(crate) fn classify_status(status: StatusCode, context: &str, body: &str) -> SyncError {
    let detail = if body.is_empty() {
        context.to_string()
    } else {
        format!("{}: {}", context, body)
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::AuthenticationFailure(detail)
        }
        StatusCode::UNPROCESSABLE_ENTITY => SyncError::RepositoryConflict(detail),
        s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => {
            SyncError::NetworkFailure(format!("{} {}", s.as_u16(), detail))
        }
        s => SyncError::Transport(format!("{} {}", s.as_u16(), detail)),
    }
}
