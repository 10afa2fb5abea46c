use std::path::{Path, PathBuf};

/// Repository shown when none is given on the command line.
pub const DEFAULT_REPO: &str = "kubernetes-sigs/cluster-api";
/// Tag that resolves to the most recently published release.
pub const LATEST_TAG: &str = "latest";
/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// What a failed background download does to the interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadErrorPolicy {
    /// Record the failure in the transfers panel and keep the session alive.
    #[default]
    Display,
    /// Tear down the session and exit the process with a failure status.
    Exit,
}

// ──────────────────────────────────────────────────────────────────────────────
// Config
// ──────────────────────────────────────────────────────────────────────────────

/// Settings for one relfetch run, built once at startup and passed by
/// reference to the fetcher, the downloader and the session.
///
/// # Example
/// ```rust
/// use relfetch::Config;
///
/// let config = Config::new()
///     .repo("owner/repo")
///     .tag("v1.2.3")
///     .set_output_dir("./downloads");
/// assert!(!config.is_latest());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub repository in `owner/name` format.
    pub repo: String,
    /// Release tag, or `"latest"` for the most recent published release.
    pub tag: String,
    /// API root without a trailing slash.
    pub api_url: String,
    /// Bearer token sent with the release lookup.
    pub token: Option<String>,
    /// HTTP/HTTPS proxy URL; `None` means a direct connection.
    pub proxy: Option<String>,
    /// Directory downloaded assets are written into.
    pub output_dir: PathBuf,
    /// What a failed background download does to the session.
    pub on_download_error: DownloadErrorPolicy,
}

impl Config {
    /// Create a `Config` with defaults.
    ///
    /// Token is read from `GITHUB_TOKEN` / `GH_TOKEN` and proxy from
    /// `HTTP_PROXY` / `HTTPS_PROXY`.
    pub fn new() -> Self {
        Self {
            repo: DEFAULT_REPO.to_owned(),
            tag: LATEST_TAG.to_owned(),
            api_url: DEFAULT_API_URL.to_owned(),
            token: non_empty_env("GITHUB_TOKEN").or_else(|| non_empty_env("GH_TOKEN")),
            proxy: non_empty_env("HTTP_PROXY").or_else(|| non_empty_env("HTTPS_PROXY")),
            output_dir: PathBuf::from("."),
            on_download_error: DownloadErrorPolicy::default(),
        }
    }

    /// Select the repository in `owner/name` form (builder).
    pub fn repo(mut self, repo: &str) -> Self {
        self.repo = repo.to_owned();
        self
    }

    /// Select the release tag, or `"latest"` (builder).
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_owned();
        self
    }

    /// Point at a different API root, e.g. GitHub Enterprise (builder).
    pub fn set_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Override the API token (builder).
    pub fn set_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    /// Drop any token picked up from the environment (builder).
    pub fn no_token(mut self) -> Self {
        self.token = None;
        self
    }

    /// Set an explicit HTTP/HTTPS proxy URL (builder).
    pub fn set_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_owned());
        self
    }

    /// Connect directly, ignoring any proxy picked up from the environment (builder).
    pub fn no_proxy(mut self) -> Self {
        self.proxy = None;
        self
    }

    /// Directory downloads are written into (builder).
    pub fn set_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Choose how download failures affect the session (builder).
    pub fn on_download_error(mut self, policy: DownloadErrorPolicy) -> Self {
        self.on_download_error = policy;
        self
    }

    pub fn is_latest(&self) -> bool {
        self.tag == LATEST_TAG
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}
