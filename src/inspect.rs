/// Branch/Commit Inspector: read-only branch and history listings.
use std::sync::Arc;

use crate::error::Result;
use crate::model::{Branch, Commit, RepositoryRef};
use crate::paths;
use crate::transport::{Method, Transport};
use crate::wire::{self, RawBranch, RawCommit};

const MAX_PAGE: usize = 100;

/// Branch used when the remote reports none at all.
pub const FALLBACK_BRANCH: &str = "main";

#[derive(Clone)]
pub struct Inspector {
    transport: Arc<dyn Transport>,
}

impl Inspector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Branches in the order the remote returns them.
    pub async fn list_branches(&self, repo: &RepositoryRef) -> Result<Vec<Branch>> {
        let endpoint = format!("{}/branches?per_page={MAX_PAGE}", paths::repo_endpoint(repo));
        let value = self.transport.call(&endpoint, Method::GET, None).await?;
        let raw: Vec<RawBranch> = wire::parse(value, "branch list")?;
        Ok(raw.into_iter().map(Branch::from).collect())
    }

    /// Up to `limit` commits reachable from `branch`, in the remote's order
    /// (branch head first).
    ///
    /// Never re-sorted by author date: a cherry-picked or rebased head can
    /// carry an author date older than its parent's.
    pub async fn list_commits(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        let limit = limit.clamp(1, MAX_PAGE);
        let endpoint = format!(
            "{}/commits?sha={}&per_page={limit}",
            paths::repo_endpoint(repo),
            paths::encode_segment(branch)
        );
        let value = self.transport.call(&endpoint, Method::GET, None).await?;
        let raw: Vec<RawCommit> = wire::parse(value, "commit list")?;

        Ok(raw.into_iter().take(limit).map(Commit::from).collect())
    }

    /// Pick the branch a session should start on.
    ///
    /// A failed branch listing falls back to the repository's default branch.
    pub async fn resolve_branch(&self, repo: &RepositoryRef) -> String {
        match self.list_branches(repo).await {
            Ok(branches) => pick_branch(&branches, &repo.default_branch),
            Err(e) => {
                tracing::warn!(repo = %repo.full_name(), error = %e, "branch listing failed, using default branch");
                repo.default_branch.clone()
            }
        }
    }
}

/// The default branch if listed, else the first listed branch, else `main`.
pub fn pick_branch(branches: &[Branch], default_branch: &str) -> String {
    branches
        .iter()
        .find(|b| b.name == default_branch)
        .or_else(|| branches.first())
        .map(|b| b.name.clone())
        .unwrap_or_else(|| FALLBACK_BRANCH.to_string())
}
