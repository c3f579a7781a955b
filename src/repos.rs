/// Account-level operations: the authenticated user and their repositories.
use std::sync::Arc;

use serde_json::json;

use crate::error::Result;
use crate::model::{NewRepository, Repository, RepositoryRef, User};
use crate::paths;
use crate::transport::{Method, Transport};
use crate::wire;

#[derive(Clone)]
pub struct Account {
    transport: Arc<dyn Transport>,
}

impl Account {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn whoami(&self) -> Result<User> {
        let value = self.transport.call("/user", Method::GET, None).await?;
        wire::parse(value, "user")
    }

    /// Repositories visible to the account, most recently updated first.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let value = self
            .transport
            .call("/user/repos?sort=updated&per_page=100", Method::GET, None)
            .await?;
        wire::parse(value, "repository list")
    }

    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository> {
        let endpoint = paths::repo_endpoint(&RepositoryRef::new(owner, name, ""));
        let value = self.transport.call(&endpoint, Method::GET, None).await?;
        wire::parse(value, "repository")
    }

    /// Create a repository with an initial commit so it has a default branch.
    pub async fn create_repository(&self, new: &NewRepository) -> Result<Repository> {
        let body = json!({
            "name": new.name,
            "description": new.description,
            "private": new.private,
            "auto_init": true,
        });
        let value = self
            .transport
            .call("/user/repos", Method::POST, Some(body))
            .await?;
        let repo: Repository = wire::parse(value, "repository")?;
        tracing::info!(repo = %repo.full_name, private = repo.private, "created repository");
        Ok(repo)
    }

    pub async fn delete_repository(&self, repo: &RepositoryRef) -> Result<()> {
        self.transport
            .call(&paths::repo_endpoint(repo), Method::DELETE, None)
            .await?;
        tracing::info!(repo = %repo.full_name(), "deleted repository");
        Ok(())
    }
}
