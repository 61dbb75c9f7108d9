//! Audio item references

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One unit of work: a reference to an audio file
///
/// Items are immutable. The audio content is never cached; every call to
/// [`Item::read_bytes`] goes back to storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    path: PathBuf,
}

/// Filesystem metadata for an item (informational, never counts as a hit)
#[derive(Debug, Clone, Serialize)]
pub struct ItemMetadata {
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name sent to providers that accept uploads
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string())
    }

    /// Read the raw audio content
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    pub async fn metadata(&self) -> std::io::Result<ItemMetadata> {
        let meta = tokio::fs::metadata(&self.path).await?;
        Ok(ItemMetadata {
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<&str> for Item {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
