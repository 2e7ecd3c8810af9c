//! File walking functionality for directory traversal

use crate::config::IndexingConfig;
use crate::error::IndexingError;
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Recursively lists files whose extension is allow-listed, pruning excluded
/// directories before they are entered.
pub struct FileCollector {
    pub(crate) root: PathBuf,
    pub(crate) extensions: HashSet<String>,
    pub(crate) exclude_dirs: HashSet<String>,
}

impl FileCollector {
    /// Collector with the default extension allow-list and exclude set
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::from_config(root, &IndexingConfig::default())
    }

    pub fn from_config(root: impl AsRef<Path>, config: &IndexingConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: HashSet::new(),
            exclude_dirs: HashSet::new(),
        }
        .with_extensions(config.extensions.clone())
        .with_exclude_dirs(config.exclude_dirs.clone())
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().collect();
        self
    }

    pub fn with_exclude_dirs(mut self, exclude_dirs: Vec<String>) -> Self {
        self.exclude_dirs = exclude_dirs.into_iter().collect();
        self
    }

    /// Walk the root and return the absolute paths of all eligible files.
    ///
    /// Entries that cannot be read are logged and skipped.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Err(IndexingError::DirectoryNotFound(self.root.display().to_string()).into());
        }
        if !self.root.is_dir() {
            return Err(IndexingError::NotADirectory(self.root.display().to_string()).into());
        }

        let root = self.root.canonicalize().map_err(|e| {
            IndexingError::WalkFailed(format!("{}: {}", self.root.display(), e))
        })?;

        let mut files = Vec::new();

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            if self.has_allowed_extension(path) {
                files.push(path.to_path_buf());
            } else {
                tracing::trace!("Skipping file with unlisted extension: {:?}", path);
            }
        }

        tracing::info!("Found {} files under {}", files.len(), root.display());
        Ok(files)
    }

    /// The walk root itself is never pruned, only directories below it
    pub(crate) fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude_dirs.contains(name))
    }

    pub(crate) fn has_allowed_extension(&self, path: &Path) -> bool {
        let file_type = file_type_of(path);
        !file_type.is_empty() && self.extensions.contains(&file_type)
    }
}

/// Extension of a path including the leading dot, or an empty string.
///
/// Dotfiles such as `.eslintrc` have no extension.
pub fn file_type_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Path of `path` relative to `root`, always '/'-separated
pub fn relative_source(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
