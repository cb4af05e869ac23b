use crate::{RepositoryStateError, SourceControl};
use std::path::{Path, PathBuf};

/// In-memory checkout with a fixed branch and revision.
///
/// `revision: None` models a repository without commits.
pub struct MockCheckout {
    location: PathBuf,
    branch: String,
    revision: Option<String>,
}

impl MockCheckout {
    pub fn committed(branch: &str, revision: &str) -> Self {
        Self {
            location: PathBuf::from("/mock/checkout"),
            branch: branch.to_owned(),
            revision: Some(revision.to_owned()),
        }
    }

    pub fn empty() -> Self {
        Self {
            location: PathBuf::from("/mock/checkout"),
            branch: "main".to_owned(),
            revision: None,
        }
    }
}

impl SourceControl for MockCheckout {
    fn location(&self) -> &Path {
        &self.location
    }

    fn branch(&self) -> Result<String, RepositoryStateError> {
        if self.revision.is_none() {
            return Err(RepositoryStateError::NoCommits(self.location.clone()));
        }
        Ok(self.branch.clone())
    }

    fn revision(&self) -> Result<String, RepositoryStateError> {
        self.revision
            .clone()
            .ok_or_else(|| RepositoryStateError::NoCommits(self.location.clone()))
    }
}
