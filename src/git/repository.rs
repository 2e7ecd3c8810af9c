use crate::error::GitError;
use anyhow::Result;
use git2::build::CheckoutBuilder;
use git2::{Commit, ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use std::fmt;
use std::path::{Path, PathBuf};

const SYMLINK_MODE: i32 = 0o120000;

/// Where HEAD pointed before a checkout side-trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD attached to a branch, e.g. `refs/heads/main`
    Branch { refname: String, oid: Oid },
    /// HEAD pointing directly at a commit
    Detached(Oid),
}

impl HeadState {
    pub fn oid(&self) -> Oid {
        match self {
            HeadState::Branch { oid, .. } => *oid,
            HeadState::Detached(oid) => *oid,
        }
    }

    pub fn commit_hash(&self) -> String {
        self.oid().to_string()
    }
}

impl fmt::Display for HeadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadState::Branch { refname, oid } => write!(f, "{} ({})", refname, oid),
            HeadState::Detached(oid) => write!(f, "detached {}", oid),
        }
    }
}

/// A non-bare git repository and its working directory
pub struct GitRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl GitRepo {
    /// Discover the repository containing `path` (walks up the directory tree)
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| {
            GitError::RepoNotFound(format!("{} ({})", path.display(), e.message()))
        })?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::BareRepository(repo.path().display().to_string()))?
            .to_path_buf();

        tracing::debug!("Opened git repository at: {}", workdir.display());
        Ok(Self { repo, workdir })
    }

    /// Root of the working tree
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Full hash of the commit HEAD points at
    pub fn head_commit(&self) -> Result<String> {
        Ok(self.head_state()?.commit_hash())
    }

    /// Capture the current HEAD, distinguishing a branch from a detached HEAD
    pub fn head_state(&self) -> Result<HeadState> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::HeadUnresolved(e.message().to_string()))?;
        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::HeadUnresolved(e.message().to_string()))?
            .id();

        if head.is_branch()
            && let Some(refname) = head.name()
        {
            return Ok(HeadState::Branch {
                refname: refname.to_string(),
                oid,
            });
        }
        Ok(HeadState::Detached(oid))
    }

    fn find_commit(&self, rev: &str) -> Result<Commit<'_>, GitError> {
        self.repo
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| GitError::RevisionNotFound {
                rev: rev.to_string(),
                reason: e.message().to_string(),
            })
    }

    /// Full hash of any revision git can resolve to a commit (short hashes, branch names)
    pub fn resolve_commit(&self, rev: &str) -> Result<String> {
        Ok(self.find_commit(rev)?.id().to_string())
    }

    /// Check `rev` out into the working tree and detach HEAD at it.
    ///
    /// Uses a safe checkout: uncommitted changes that would be overwritten abort it.
    pub fn checkout_commit(&self, rev: &str) -> Result<()> {
        let commit = self.find_commit(rev)?;
        let failed = |e: git2::Error| GitError::CommandFailed {
            operation: "checkout".to_string(),
            target: rev.to_string(),
            reason: e.message().to_string(),
        };

        let mut options = CheckoutBuilder::new();
        options.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut options))
            .map_err(failed)?;
        self.repo.set_head_detached(commit.id()).map_err(failed)?;

        tracing::info!("Checked out {} ({})", rev, commit.id());
        Ok(())
    }

    /// Put the working tree and HEAD back the way `state` describes, re-attaching
    /// the branch if there was one
    pub fn restore(&self, state: &HeadState) -> Result<()> {
        let failed = |e: git2::Error| GitError::RestoreFailed {
            target: state.to_string(),
            reason: e.message().to_string(),
        };

        let commit = self.repo.find_commit(state.oid()).map_err(failed)?;
        let mut options = CheckoutBuilder::new();
        options.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut options))
            .map_err(failed)?;

        match state {
            HeadState::Branch { refname, .. } => self.repo.set_head(refname).map_err(failed)?,
            HeadState::Detached(oid) => self.repo.set_head_detached(*oid).map_err(failed)?,
        }

        tracing::info!("Restored HEAD to {}", state);
        Ok(())
    }

    /// Write the tree of `rev` into `dest` without touching the working tree or HEAD.
    ///
    /// Symlinks and submodules are skipped. Returns the number of files written.
    pub fn export_commit(&self, rev: &str, dest: &Path) -> Result<usize> {
        let commit = self.find_commit(rev)?;
        let export_failed = |reason: String| GitError::ExportFailed {
            commit: rev.to_string(),
            dest: dest.display().to_string(),
            reason,
        };

        let tree = commit.tree().map_err(|e| export_failed(e.message().to_string()))?;
        std::fs::create_dir_all(dest).map_err(|e| export_failed(e.to_string()))?;

        let mut written = 0;
        let mut failure: Option<String> = None;

        let walked = tree.walk(TreeWalkMode::PreOrder, |parent, entry| {
            if entry.kind() != Some(ObjectType::Blob) || entry.filemode() == SYMLINK_MODE {
                return TreeWalkResult::Ok;
            }
            let Some(name) = entry.name() else {
                return TreeWalkResult::Ok;
            };

            let path = dest.join(parent).join(name);
            match self.write_blob(entry.id(), &path) {
                Ok(()) => {
                    written += 1;
                    TreeWalkResult::Ok
                }
                Err(e) => {
                    failure = Some(format!("{}: {}", path.display(), e));
                    TreeWalkResult::Abort
                }
            }
        });

        if let Some(reason) = failure {
            return Err(export_failed(reason).into());
        }
        walked.map_err(|e| export_failed(e.message().to_string()))?;

        tracing::info!("Exported {} files of {} to {}", written, rev, dest.display());
        Ok(written)
    }

    fn write_blob(&self, id: Oid, path: &Path) -> Result<()> {
        let blob = self.repo.find_blob(id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, blob.content())?;
        Ok(())
    }
}
