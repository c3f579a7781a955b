/// Response and request bodies of the remote contents, branches and commits
/// endpoints, and their conversion into domain values.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Branch, Commit, EntryKind, TreeEntry};

/// An entry as returned by the contents endpoint.
///
/// `encoding`/`content` are only present when a single file is fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<RawEntry> for TreeEntry {
    fn from(raw: RawEntry) -> Self {
        // Symlinks and submodules are addressed like files.
        let kind = if raw.kind == "dir" {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        TreeEntry {
            name: raw.name,
            path: raw.path,
            content_hash: raw.sha,
            byte_size: raw.size,
            kind,
            fetch_url: raw.download_url,
            view_url: raw.html_url,
        }
    }
}

/// The contents endpoint answers with one object for a file and an array
/// for a directory, at the same URL shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    Many(Vec<RawEntry>),
    Single(RawEntry),
}

impl Contents {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::Malformed(format!("unexpected contents response: {e}")))
    }
}

/// Body of a create-or-replace request.
#[derive(Debug, Serialize)]
pub struct WriteRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

/// Body of a delete request.
#[derive(Debug, Serialize)]
pub struct DeleteRequest<'a> {
    pub message: &'a str,
    pub sha: &'a str,
    pub branch: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub content: RawEntry,
}

#[derive(Debug, Deserialize)]
pub struct RawBranch {
    pub name: String,
    pub commit: RawBranchCommit,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawBranchCommit {
    pub sha: String,
}

impl From<RawBranch> for Branch {
    fn from(raw: RawBranch) -> Self {
        Branch {
            name: raw.name,
            head_commit_hash: raw.commit.sha,
            is_protected: raw.protected,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub commit: RawCommitDetail,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCommitDetail {
    pub author: RawSignature,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RawSignature {
    #[serde(default)]
    pub name: String,
    pub date: DateTime<Utc>,
}

impl From<RawCommit> for Commit {
    fn from(raw: RawCommit) -> Self {
        Commit {
            hash: raw.sha,
            author_name: raw.commit.author.name,
            author_timestamp: raw.commit.author.date,
            message: raw.commit.message,
            view_url: raw.html_url,
        }
    }
}

/// Deserialize a transport result into a typed body.
pub fn parse<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Malformed(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file_json(name: &str) -> Value {
        json!({
            "name": name,
            "path": format!("docs/{name}"),
            "sha": "abc123",
            "size": 12,
            "type": "file",
            "download_url": "https://raw.example/docs/a.md",
            "html_url": "https://example/blob/docs/a.md",
        })
    }

    #[test]
    fn array_is_many() {
        let contents = Contents::from_value(json!([file_json("a.md"), file_json("b.md")])).unwrap();
        match contents {
            Contents::Many(entries) => assert_eq!(entries.len(), 2),
            Contents::Single(_) => panic!("expected Many"),
        }
    }

    #[test]
    fn object_is_single() {
        let mut value = file_json("a.md");
        value["encoding"] = json!("base64");
        value["content"] = json!("aGk=\n");
        match Contents::from_value(value).unwrap() {
            Contents::Single(raw) => {
                assert_eq!(raw.encoding.as_deref(), Some("base64"));
                assert_eq!(raw.content.as_deref(), Some("aGk=\n"));
            }
            Contents::Many(_) => panic!("expected Single"),
        }
    }

    #[test]
    fn entry_kind_mapping() {
        let mut dir = file_json("sub");
        dir["type"] = json!("dir");
        dir["download_url"] = Value::Null;
        let raw: RawEntry = serde_json::from_value(dir).unwrap();
        let entry = TreeEntry::from(raw);
        assert_eq!(entry.kind, EntryKind::Directory);
        assert_eq!(entry.fetch_url, None);

        let mut link = file_json("link");
        link["type"] = json!("symlink");
        let raw: RawEntry = serde_json::from_value(link).unwrap();
        assert_eq!(TreeEntry::from(raw).kind, EntryKind::File);
    }

    #[test]
    fn write_request_omits_missing_sha() {
        let body = WriteRequest {
            message: "add",
            content: "aGk=".into(),
            branch: "main",
            sha: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("sha").is_none());
        assert_eq!(value["branch"], "main");
    }

    #[test]
    fn commit_conversion() {
        let raw: RawCommit = serde_json::from_value(json!({
            "sha": "c0ffee",
            "commit": {
                "author": { "name": "Ada", "date": "2024-03-01T10:00:00Z" },
                "message": "feat: first\n\nbody"
            },
            "html_url": "https://example/commit/c0ffee"
        }))
        .unwrap();
        let commit = Commit::from(raw);
        assert_eq!(commit.author_name, "Ada");
        assert_eq!(commit.summary(), "feat: first");
        assert_eq!(commit.author_timestamp.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            Contents::from_value(json!({"message": "hi"})),
            Err(Error::Malformed(_))
        ));
    }
}
