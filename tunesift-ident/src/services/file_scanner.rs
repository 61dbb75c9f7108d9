//! Audio item enumeration
//!
//! Lists the files of the songs folder as [`Item`]s, sorted by path so the
//! order is stable for one run.

use crate::models::Item;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Item enumeration errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Source of the batch to identify
pub trait ItemSource {
    fn list_items(&self) -> Result<Vec<Item>, ScanError>;
}

/// Lists regular files below a folder
pub struct DirectoryItemSource {
    root: PathBuf,
    recursive: bool,
    ignore_patterns: Vec<String>,
}

impl DirectoryItemSource {
    /// Create a source with default ignore patterns
    ///
    /// Ignores system files like .DS_Store and Thumbs.db, and anything whose
    /// name starts with a dot.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            ignore_patterns: vec![".DS_Store".to_string(), "Thumbs.db".to_string()],
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        // The root itself is always walked, even when named like ".songs"
        if entry.depth() == 0 {
            return true;
        }

        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') {
            return false;
        }

        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name == pattern.as_str())
    }
}

impl ItemSource for DirectoryItemSource {
    fn list_items(&self) -> Result<Vec<Item>, ScanError> {
        if !self.root.exists() {
            return Err(ScanError::PathNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        files.sort();
        tracing::debug!(root = %self.root.display(), count = files.len(), "Items listed");

        Ok(files.into_iter().map(Item::new).collect())
    }
}
