//! # relfetch
//!
//! Browse the assets of one GitHub release in the terminal and download the
//! selected one in the background while the table stays interactive.
//!
//! The pieces are usable on their own:
//!
//! ```rust,no_run
//! use relfetch::{Config, Downloader, ReleaseFetcher};
//!
//! #[tokio::main]
//! async fn main() -> relfetch::Result<()> {
//!     let config = Config::new().repo("owner/repo").set_output_dir("./out");
//!     let release = ReleaseFetcher::new(&config)?
//!         .fetch(&config.repo, &config.tag)
//!         .await?;
//!     if let Some(asset) = release.assets.first() {
//!         Downloader::new(&config)?.download(&asset.download_url, None).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod downloader;
pub mod error;
pub mod progress;
pub mod release;
pub mod session;
pub mod size;
pub mod table;
pub mod tui;
pub mod ui;

pub use api::ReleaseFetcher;
pub use config::{Config, DownloadErrorPolicy};
pub use downloader::{DownloadOutcome, DownloadProgress, Downloader, ProgressFn};
pub use error::{Error, Result};
pub use release::{AssetRecord, ReleaseRecord};
pub use session::{Effect, Event, Session};
pub use size::human_readable_size;
pub use table::AssetTable;
