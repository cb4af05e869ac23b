//! Source-control identity for kiln packages.
//!
//! A package version is never declared by hand. It is derived from the
//! checkout the recipe lives in: `{branch}_{revision prefix}`. This crate
//! defines the `SourceControl` collaborator interface, a git implementation
//! backed by `gix`, and the version composition itself.

pub mod git;
pub mod mock;

pub use git::GitCheckout;
pub use mock::MockCheckout;

use kiln_schema::reference::is_component_char;
use kiln_schema::Version;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Number of leading hex characters of the commit id kept in a version.
///
/// 16 hex characters are 64 bits; a collision becomes likely only around
/// 2^32 commits in one history.
pub const REVISION_PREFIX_LEN: usize = 16;

/// Branch name reported for a detached HEAD.
pub const DETACHED_BRANCH: &str = "HEAD";

#[derive(Debug, Error)]
pub enum RepositoryStateError {
    #[error("'{path}' is not inside a git checkout: {reason}")]
    NotARepository { path: PathBuf, reason: String },
    #[error("repository at '{0}' has no commits yet")]
    NoCommits(PathBuf),
    #[error("failed to read repository state at '{path}': {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("revision id '{0}' is too short to derive a version")]
    ShortRevision(String),
}

/// Read-only queries kiln needs from a source-control checkout.
pub trait SourceControl {
    /// Root of the checkout, for diagnostics.
    fn location(&self) -> &Path;

    /// Short name of the checked-out branch, or [`DETACHED_BRANCH`].
    fn branch(&self) -> Result<String, RepositoryStateError>;

    /// Full hex id of the checked-out commit.
    fn revision(&self) -> Result<String, RepositoryStateError>;
}

/// Derive the package version from the git checkout containing `location`.
pub fn resolve_version(location: impl AsRef<Path>) -> Result<Version, RepositoryStateError> {
    let checkout = GitCheckout::discover(location.as_ref())?;
    resolve_version_with(&checkout)
}

/// Compose `{branch}_{revision prefix}` from any source-control collaborator.
pub fn resolve_version_with(
    scm: &dyn SourceControl,
) -> Result<Version, RepositoryStateError> {
    let branch = scm.branch()?;
    let revision = scm.revision()?;

    let short = revision
        .get(..REVISION_PREFIX_LEN)
        .ok_or_else(|| RepositoryStateError::ShortRevision(revision.clone()))?;

    let version = format!("{}_{short}", sanitize_branch(&branch));
    debug!(
        location = %scm.location().display(),
        %branch,
        %version,
        "resolved package version"
    );
    Ok(Version::new(version))
}

/// Replace characters that cannot appear in a version component with `-`.
///
/// `feature/login` becomes `feature-login`.
pub fn sanitize_branch(branch: &str) -> String {
    branch
        .chars()
        .map(|c| if is_component_char(c) { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REV: &str = "abc123def4567890fedcba9876543210deadbeef";

    #[test]
    fn composes_branch_and_revision_prefix() {
        let scm = MockCheckout::committed("main", REV);
        let version = resolve_version_with(&scm).unwrap();
        assert_eq!(version, "main_abc123def4567890");
    }

    #[test]
    fn resolution_is_deterministic() {
        let scm = MockCheckout::committed("develop", REV);
        assert_eq!(
            resolve_version_with(&scm).unwrap(),
            resolve_version_with(&scm).unwrap()
        );
    }

    #[test]
    fn sanitizes_branch_separators() {
        let scm = MockCheckout::committed("feature/login page", REV);
        let version = resolve_version_with(&scm).unwrap();
        assert_eq!(version, "feature-login-page_abc123def4567890");
    }

    #[test]
    fn keeps_version_friendly_branch_names() {
        assert_eq!(sanitize_branch("CMake_update-win.2"), "CMake_update-win.2");
    }

    #[test]
    fn empty_repository_fails() {
        let scm = MockCheckout::empty();
        assert!(matches!(
            resolve_version_with(&scm),
            Err(RepositoryStateError::NoCommits(_))
        ));
    }

    #[test]
    fn short_revision_fails_instead_of_padding() {
        let scm = MockCheckout::committed("main", "abc123");
        assert!(matches!(
            resolve_version_with(&scm),
            Err(RepositoryStateError::ShortRevision(_))
        ));
    }
}
