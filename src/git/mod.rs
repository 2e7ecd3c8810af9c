//! Git operations for commit-scoped collections
//!
//! Resolves which commit a collection belongs to, temporarily checks other commits
//! out (restoring HEAD afterwards), and exports commit trees to scratch directories.

/// Temporary checkout with guaranteed HEAD restoration
pub mod checkout;
/// Repository discovery, HEAD inspection, checkout and tree export
pub mod repository;
/// Commit trees exported to disk
pub mod snapshot;

#[cfg(test)]
pub(crate) mod fixtures;

pub use checkout::CheckoutGuard;
pub use repository::{GitRepo, HeadState};
pub use snapshot::Snapshot;

use crate::error::ValidationError;
use anyhow::Result;
use std::path::Path;

/// Check that a commit identifier can be embedded in a collection name
pub fn validate_commit_hash(hash: &str) -> Result<(), ValidationError> {
    if hash.is_empty() {
        return Err(ValidationError::Empty("commit hash".to_string()));
    }
    if !hash
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::InvalidCommitHash(hash.to_string()));
    }
    Ok(())
}

/// The commit a request refers to: `requested` verbatim when given, otherwise the
/// HEAD commit of the repository containing `dir`
pub fn resolve_commit_hash(requested: Option<&str>, dir: &Path) -> Result<String> {
    let hash = match requested {
        Some(hash) => hash.trim().to_string(),
        None => GitRepo::discover(dir)?.head_commit()?,
    };
    validate_commit_hash(&hash)?;
    Ok(hash)
}
