//! Commit messages from a local git checkout.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::traits::Vcs;

/// [`Vcs`] backed by `git2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitVcs;

impl GitVcs {
    /// Create the adapter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Vcs for GitVcs {
    async fn commit_message(&self, repo_path: &Path, rev: &str) -> Result<String> {
        debug!("Reading commit message of {} in {}", rev, repo_path.display());
        let repo = git2::Repository::open(repo_path)?;
        let commit = repo.revparse_single(rev)?.peel_to_commit()?;
        Ok(String::from_utf8_lossy(commit.message_bytes()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollabError;

    fn commit(repo: &git2::Repository, message: &str) -> git2::Oid {
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap()
    }

    #[tokio::test]
    async fn test_commit_message() {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let first = commit(&repo, "Bug 1 - first r=someone");
        commit(&repo, "Bug 2 - second r=perftest-reviewers\n\nDetails.");

        let vcs = GitVcs::new();
        let head = vcs.commit_message(dir.path(), "HEAD").await.unwrap();
        assert!(head.starts_with("Bug 2 - second r=perftest-reviewers"));

        let older = vcs.commit_message(dir.path(), &first.to_string()).await.unwrap();
        assert_eq!(older, "Bug 1 - first r=someone");
    }

    #[tokio::test]
    async fn test_unknown_revision() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let err = GitVcs::new().commit_message(dir.path(), "deadbeef").await.unwrap_err();
        assert!(matches!(err, CollabError::Git(_)));
    }
}
