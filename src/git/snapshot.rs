use super::repository::GitRepo;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A commit's tree exported into a scratch directory, deleted on drop
pub struct Snapshot {
    path: PathBuf,
    files: usize,
}

impl Snapshot {
    /// Export `rev` from `repo` into `{root}/{full commit hash}`, replacing any
    /// stale export
    pub fn export(repo: &GitRepo, rev: &str, root: &Path) -> Result<Self> {
        let path = root.join(repo.resolve_commit(rev)?);
        if path.exists() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to clear stale snapshot {}", path.display()))?;
        }

        // A failed export drops the snapshot, removing whatever was written
        let mut snapshot = Self { path, files: 0 };
        snapshot.files = repo.export_commit(rev, &snapshot.path)?;
        Ok(snapshot)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of files written
    pub fn files(&self) -> usize {
        self.files
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        if self.path.exists()
            && let Err(e) = std::fs::remove_dir_all(&self.path)
        {
            tracing::warn!("Failed to remove snapshot {}: {}", self.path.display(), e);
        }
    }
}
