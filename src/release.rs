use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One downloadable file attached to a release. Does not contain all fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetRecord {
    pub name: String,
    pub size: u64,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// A published release of a repository. Does not contain all fields.
///
/// Asset order is the order GitHub returned them in and is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseRecord {
    pub tag_name: String,
    #[serde(rename = "name", default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl ReleaseRecord {
    /// Release title, falling back to the tag for untitled releases.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.tag_name,
        }
    }

    /// First asset called `name`.
    pub fn asset(&self, name: &str) -> Option<&AssetRecord> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}
