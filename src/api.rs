use std::time::Duration;

use log::{debug, info};
use reqwest::{Client, StatusCode};

use crate::config::{Config, LATEST_TAG};
use crate::downloader::build_client;
use crate::error::{Error, Result};
use crate::release::ReleaseRecord;

const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves a repository and tag to a [`ReleaseRecord`] through the GitHub
/// REST API.
pub struct ReleaseFetcher {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl ReleaseFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config.proxy.as_deref(), Some(METADATA_TIMEOUT))?,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        })
    }

    /// API URL for `tag` of `repo`; `"latest"` maps to the latest-release endpoint.
    pub fn release_url(&self, repo: &str, tag: &str) -> String {
        if tag == LATEST_TAG {
            format!("{}/repos/{repo}/releases/latest", self.api_url)
        } else {
            format!("{}/repos/{repo}/releases/tags/{tag}", self.api_url)
        }
    }

    /// Fetch the release. No retries: the caller decides what a failure means.
    pub async fn fetch(&self, repo: &str, tag: &str) -> Result<ReleaseRecord> {
        let url = self.release_url(repo, tag);
        debug!("fetching release metadata from {url}");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, repo, tag, &body));
        }

        let body = resp.bytes().await?;
        let release: ReleaseRecord = serde_json::from_slice(&body)
            .map_err(|e| Error::InvalidResponse(format!("release payload from {url}: {e}")))?;

        info!(
            "{repo} {}: {} asset(s)",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }
}

fn status_error(status: StatusCode, repo: &str, tag: &str, body: &str) -> Error {
    let detail = github_message(body).unwrap_or_else(|| status.to_string());
    match status {
        StatusCode::NOT_FOUND if tag == LATEST_TAG => {
            Error::NotFound(format!("no published release for {repo} ({detail})"))
        }
        StatusCode::NOT_FOUND => Error::NotFound(format!("release {tag} of {repo} ({detail})")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("GitHub API returned {status}: {detail}"))
        }
        _ => Error::Network(format!("GitHub API returned {status}: {detail}")),
    }
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`.
fn github_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["message"].as_str().map(str::to_owned)
}
