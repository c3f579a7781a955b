/// Domain values handed to callers. All of them are rebuilt from fresh remote
/// responses on every call; nothing here is cached.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote repository selected for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}

impl RepositoryRef {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            default_branch: default_branch.into(),
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    // Declaration order is listing order: directories first.
    Directory,
    File,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Directory => "dir",
            EntryKind::File => "file",
        }
    }
}

/// One entry of a directory listing on a given branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    /// Match token required to overwrite or delete this exact version.
    pub content_hash: String,
    pub byte_size: u64,
    pub kind: EntryKind,
    pub fetch_url: Option<String>,
    pub view_url: Option<String>,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub head_commit_hash: String,
    pub is_protected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub hash: String,
    pub author_name: String,
    pub author_timestamp: DateTime<Utc>,
    pub message: String,
    pub view_url: Option<String>,
}

impl Commit {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Repository metadata as listed for the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default = "default_branch_name")]
    pub default_branch: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub language: Option<String>,
    pub owner: Owner,
}

fn default_branch_name() -> String {
    "main".to_string()
}

impl Repository {
    pub fn to_ref(&self) -> RepositoryRef {
        RepositoryRef::new(&self.owner.login, &self.name, &self.default_branch)
    }
}

/// Parameters for creating a repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewRepository {
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
}
