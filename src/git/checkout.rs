use super::repository::{GitRepo, HeadState};
use anyhow::Result;

/// Holds a temporary checkout of another commit and puts HEAD back when
/// restored or dropped.
///
/// Dropping the guard (early return, `?`, panic unwind) restores HEAD and logs any
/// failure. Call [`CheckoutGuard::restore`] to get the restore error instead.
pub struct CheckoutGuard {
    repo: GitRepo,
    original: Option<HeadState>,
}

impl CheckoutGuard {
    /// Record the current HEAD, then check out `rev`.
    ///
    /// If the checkout itself fails, HEAD is restored before the error is returned.
    pub fn checkout(repo: GitRepo, rev: &str) -> Result<Self> {
        let original = repo.head_state()?;
        tracing::info!("Temporarily checking out {} (HEAD is {})", rev, original);

        let guard = Self {
            repo,
            original: Some(original),
        };
        guard.repo.checkout_commit(rev)?;
        Ok(guard)
    }

    /// HEAD as it was before the checkout
    pub fn original(&self) -> Option<&HeadState> {
        self.original.as_ref()
    }

    /// Restore the original HEAD now, reporting failure to the caller
    pub fn restore(mut self) -> Result<()> {
        match self.original.take() {
            Some(state) => self.repo.restore(&state),
            None => Ok(()),
        }
    }
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        if let Some(state) = self.original.take()
            && let Err(e) = self.repo.restore(&state)
        {
            tracing::error!("Failed to restore HEAD to {}: {:#}", state, e);
        }
    }
}
