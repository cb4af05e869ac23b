use crate::{RepositoryStateError, SourceControl, DETACHED_BRANCH};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A git checkout opened read-only through `gix`.
pub struct GitCheckout {
    location: PathBuf,
    repo: gix::Repository,
}

impl GitCheckout {
    /// Open the checkout containing `location`, searching parent directories
    /// the way `git` itself does.
    pub fn discover(location: &Path) -> Result<Self, RepositoryStateError> {
        let repo = gix::discover(location).map_err(|e| RepositoryStateError::NotARepository {
            path: location.to_path_buf(),
            reason: e.to_string(),
        })?;
        let root = repo
            .workdir()
            .map_or_else(|| repo.git_dir().to_path_buf(), Path::to_path_buf);
        debug!(location = %location.display(), root = %root.display(), "opened git checkout");
        Ok(Self {
            location: root,
            repo,
        })
    }

    fn head(&self) -> Result<gix::Head<'_>, RepositoryStateError> {
        let head = self.repo.head().map_err(|e| RepositoryStateError::Read {
            path: self.location.clone(),
            reason: format!("cannot read HEAD: {e}"),
        })?;
        if head.is_unborn() {
            return Err(RepositoryStateError::NoCommits(self.location.clone()));
        }
        Ok(head)
    }
}

impl SourceControl for GitCheckout {
    fn location(&self) -> &Path {
        &self.location
    }

    fn branch(&self) -> Result<String, RepositoryStateError> {
        let head = self.head()?;
        Ok(head.referent_name().map_or_else(
            || DETACHED_BRANCH.to_owned(),
            |name| name.shorten().to_string(),
        ))
    }

    fn revision(&self) -> Result<String, RepositoryStateError> {
        let mut head = self.head()?;
        let commit = head
            .peel_to_commit()
            .map_err(|e| RepositoryStateError::Read {
                path: self.location.clone(),
                reason: format!("cannot resolve HEAD to a commit: {e}"),
            })?;
        Ok(commit.id.to_string())
    }
}
