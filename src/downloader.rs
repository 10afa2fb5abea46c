use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::{Client, Proxy, Url};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::error::{Error, Result};

/// Callback receiving progress snapshots of one download.
pub type ProgressFn = Arc<dyn Fn(&DownloadProgress) + Send + Sync>;

/// Minimum spacing between two intermediate progress reports.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Snapshot of an in-flight download.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    /// Bytes written to disk so far.
    pub bytes: u64,
    /// Declared content length; `None` when the server did not send one.
    pub total: Option<u64>,
    /// Time since the response headers arrived.
    pub elapsed: Duration,
}

impl DownloadProgress {
    /// Completed fraction in `[0, 1]`, or `None` when the size is unknown.
    pub fn ratio(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some((self.bytes as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }

    pub fn mib_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / (1024.0 * 1024.0) / secs
        } else {
            0.0
        }
    }
}

/// Where a finished download landed and how large it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// File the asset was written to.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
}

/// Build an HTTP client, optionally with proxy support and a request timeout.
///
/// `proxy` is the only proxy the client uses; reqwest's own environment
/// lookup is switched off so `Config` stays the single source.
pub(crate) fn build_client(proxy: Option<&str>, timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!("relfetch/", env!("CARGO_PKG_VERSION")))
        .no_proxy();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(proxy_url) = proxy {
        builder = builder.proxy(Proxy::all(proxy_url)?);
    }
    Ok(builder.build()?)
}

/// Last non-empty path segment of `url`, used as the local file name.
pub fn file_name_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_owned)
}

/// Streams release assets to local disk.
///
/// Cheap to clone; every clone shares the same connection pool, so one
/// `Downloader` can serve any number of concurrent tasks.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            // No timeout: a large asset may legitimately stream for a long time.
            client: build_client(config.proxy.as_deref(), None)?,
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Local path `url` downloads to.
    pub fn destination(&self, url: &str) -> Result<PathBuf> {
        let parsed =
            Url::parse(url).map_err(|e| Error::Network(format!("invalid URL {url}: {e}")))?;
        let name = file_name_from_url(&parsed).ok_or_else(|| Error::FileSystem {
            path: self.output_dir.clone(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot derive a file name from {url}"),
            ),
        })?;
        Ok(self.output_dir.join(name))
    }

    /// Download `url` into the output directory, overwriting any file of the
    /// same name.
    ///
    /// Progress is reported at most every [`PROGRESS_INTERVAL`], and always
    /// once more at the end with the final byte count. On a mid-stream
    /// failure the partial file is left on disk.
    pub async fn download(
        &self,
        url: &str,
        progress: Option<ProgressFn>,
    ) -> Result<DownloadOutcome> {
        let path = self.destination(url)?;
        let mut file = File::create(&path)
            .await
            .map_err(|source| Error::FileSystem {
                path: path.clone(),
                source,
            })?;

        info!("downloading {url} to {}", path.display());
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            warn!("{url} answered {}", resp.status());
            return Err(Error::Network(format!(
                "download of {url} failed with status {}",
                resp.status()
            )));
        }

        let total = resp.content_length();
        let start = Instant::now();
        let mut last_report = start;
        let mut downloaded: u64 = 0;
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Io(io::Error::other(e)))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(progress) = &progress {
                if last_report.elapsed() >= PROGRESS_INTERVAL {
                    last_report = Instant::now();
                    progress(&DownloadProgress {
                        bytes: downloaded,
                        total,
                        elapsed: start.elapsed(),
                    });
                }
            }
        }
        file.flush().await?;

        if let Some(progress) = &progress {
            progress(&DownloadProgress {
                bytes: downloaded,
                total,
                elapsed: start.elapsed(),
            });
        }

        debug!("{url}: {downloaded} bytes in {:?}", start.elapsed());
        info!("saved {}", path.display());
        Ok(DownloadOutcome {
            path,
            bytes: downloaded,
        })
    }
}
