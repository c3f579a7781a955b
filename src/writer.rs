/// File Writer: create-or-replace and single-file delete.
///
/// Every replace must prove it observed the latest version of the file by
/// sending that version's content hash. The remote rejects a stale hash with
/// 409, which surfaces as `Error::Conflict` and is never retried here.
use std::sync::Arc;

use serde_json::Value;

use crate::codec;
use crate::error::{Error, Result};
use crate::model::{RepositoryRef, TreeEntry};
use crate::paths;
use crate::transport::{Method, Transport};
use crate::tree::TreeReader;
use crate::wire::{self, Contents, DeleteRequest, WriteRequest, WriteResponse};

/// Placeholder written to make an otherwise empty directory listable.
pub const DIRECTORY_MARKER: &str = ".gitkeep";

#[derive(Clone)]
pub struct FileWriter {
    transport: Arc<dyn Transport>,
    reader: TreeReader,
}

impl FileWriter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let reader = TreeReader::new(transport.clone());
        Self { transport, reader }
    }

    /// Current content hash of the file at `path`, or `None` when the remote
    /// confirms nothing is there.
    ///
    /// Only a 404 counts as absent. Any other lookup failure is returned,
    /// so a failed lookup can never turn an update into a create.
    pub async fn current_hash(
        &self,
        repo: &RepositoryRef,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>> {
        match self.reader.lookup(repo, path, branch).await {
            Ok(Contents::Single(raw)) => Ok(Some(raw.sha)),
            Ok(Contents::Many(_)) => Err(Error::IsDirectory {
                path: path.to_string(),
            }),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create or replace the file at `path` on `branch`.
    ///
    /// Looks up the file first; if it exists, its hash is sent as the match
    /// token. Returns the entry as stored after the write.
    pub async fn write(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content: &[u8],
        message: &str,
        branch: &str,
    ) -> Result<TreeEntry> {
        let path = target_path(path)?;
        let existing = self.current_hash(repo, &path, branch).await?;
        self.submit(repo, &path, content, message, branch, existing.as_deref())
            .await
    }

    pub async fn write_text(
        &self,
        repo: &RepositoryRef,
        path: &str,
        text: &str,
        message: &str,
        branch: &str,
    ) -> Result<TreeEntry> {
        self.write(repo, path, text.as_bytes(), message, branch).await
    }

    /// Write with a caller-held match token instead of a fresh lookup.
    ///
    /// `expected_hash` is the hash the caller last saw (e.g. when the file
    /// was opened for editing); `None` means the file must not exist yet.
    pub async fn replace(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content: &[u8],
        message: &str,
        branch: &str,
        expected_hash: Option<&str>,
    ) -> Result<TreeEntry> {
        let path = target_path(path)?;
        self.submit(repo, &path, content, message, branch, expected_hash)
            .await
    }

    /// Materialize a directory by writing an empty marker file inside it.
    pub async fn create_directory_marker(
        &self,
        repo: &RepositoryRef,
        path: &str,
        message: &str,
        branch: &str,
    ) -> Result<TreeEntry> {
        let dir = target_path(path)?;
        let marker = paths::join(&dir, DIRECTORY_MARKER);
        self.write(repo, &marker, b"", message, branch).await
    }

    /// Delete one file, proving the version with `content_hash`.
    pub async fn delete_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content_hash: &str,
        message: &str,
        branch: &str,
    ) -> Result<()> {
        let path = target_path(path)?;
        let body = DeleteRequest {
            message,
            sha: content_hash,
            branch,
        };
        let endpoint = paths::contents_endpoint(repo, &path);
        self.transport
            .call(&endpoint, Method::DELETE, Some(to_body(&body)?))
            .await?;
        tracing::info!(repo = %repo.full_name(), path = %path, branch, "deleted file");
        Ok(())
    }

    async fn submit(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content: &[u8],
        message: &str,
        branch: &str,
        sha: Option<&str>,
    ) -> Result<TreeEntry> {
        let body = WriteRequest {
            message,
            content: codec::encode(content),
            branch,
            sha,
        };
        let endpoint = paths::contents_endpoint(repo, path);
        let value = self
            .transport
            .call(&endpoint, Method::PUT, Some(to_body(&body)?))
            .await?;

        let resp: WriteResponse = wire::parse(value, "write response")?;
        tracing::info!(
            repo = %repo.full_name(),
            path,
            branch,
            created = sha.is_none(),
            bytes = content.len(),
            "wrote file"
        );
        Ok(TreeEntry::from(resp.content))
    }
}

fn target_path(path: &str) -> Result<String> {
    let path = paths::normalize(path);
    if path.is_empty() {
        return Err(Error::InvalidPath(
            "a file path is required, not the repository root".to_string(),
        ));
    }
    Ok(path)
}

fn to_body<T: serde::Serialize>(body: &T) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| Error::Malformed(format!("request body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryKind;
    use crate::test_remote::MemoryRemote;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("octo", "demo", "main")
    }

    fn writer(remote: &Arc<MemoryRemote>) -> FileWriter {
        FileWriter::new(remote.clone())
    }

    #[tokio::test]
    async fn new_file_sends_no_token() {
        let remote = Arc::new(MemoryRemote::new());
        let entry = writer(&remote)
            .write_text(&repo(), "docs/new.md", "# New", "add", "main")
            .await
            .unwrap();

        assert_eq!(entry.path, "docs/new.md");
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(remote.bytes_of("main", "docs/new.md").unwrap(), b"# New");

        let puts = remote.calls_with(Method::PUT);
        assert_eq!(puts.len(), 1);
        let body = puts[0].body.as_ref().unwrap();
        assert!(body.get("sha").is_none());
        assert_eq!(body["branch"], "main");
        assert_eq!(body["message"], "add");
        assert_eq!(body["content"], codec::encode_text("# New"));
    }

    #[tokio::test]
    async fn existing_file_sends_token_from_lookup() {
        let remote = Arc::new(MemoryRemote::new());
        let sha = remote.seed("dev", "a.txt", b"old");

        let entry = writer(&remote)
            .write(&repo(), "a.txt", b"new", "update", "dev")
            .await
            .unwrap();

        let calls = remote.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, Method::GET);
        assert!(calls[0].endpoint.ends_with("?ref=dev"));
        assert_eq!(calls[1].body.as_ref().unwrap()["sha"], sha.as_str());
        assert_eq!(remote.sha_of("dev", "a.txt"), Some(entry.content_hash));
        assert_eq!(remote.bytes_of("dev", "a.txt").unwrap(), b"new");
    }

    #[tokio::test]
    async fn lookup_is_scoped_to_the_write_branch() {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed("main", "a.txt", b"on main");

        // Same path on another branch is a create there.
        writer(&remote)
            .write(&repo(), "a.txt", b"on dev", "add", "dev")
            .await
            .unwrap();

        let put = &remote.calls_with(Method::PUT)[0];
        assert!(put.body.as_ref().unwrap().get("sha").is_none());
        assert_eq!(remote.bytes_of("main", "a.txt").unwrap(), b"on main");
    }

    #[tokio::test]
    async fn stale_token_is_a_conflict() {
        let remote = Arc::new(MemoryRemote::new());
        let t1 = remote.seed("main", "a.txt", b"v1");
        remote.touch("main", "a.txt", b"v2 from elsewhere");

        let err = writer(&remote)
            .replace(&repo(), "a.txt", b"mine", "update", "main", Some(t1.as_str()))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(remote.bytes_of("main", "a.txt").unwrap(), b"v2 from elsewhere");
        // Surfaced, not retried.
        assert_eq!(remote.calls_with(Method::PUT).len(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_is_not_treated_as_create() {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed("main", "a.txt", b"v1");
        remote.fail_next(502, "Bad Gateway");

        let err = writer(&remote)
            .write(&repo(), "a.txt", b"v2", "update", "main")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(502));
        assert!(remote.calls_with(Method::PUT).is_empty());
    }

    #[tokio::test]
    async fn writing_over_a_directory_fails() {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed("main", "docs/a.md", b"a");

        let err = writer(&remote)
            .write(&repo(), "docs", b"x", "m", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IsDirectory { .. }));
    }

    #[tokio::test]
    async fn root_path_is_rejected() {
        let remote = Arc::new(MemoryRemote::new());
        let err = writer(&remote)
            .write(&repo(), "/", b"x", "m", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn directory_marker_becomes_the_only_entry() {
        let remote = Arc::new(MemoryRemote::new());
        let w = writer(&remote);
        w.create_directory_marker(&repo(), "docs/", "chore: create directory", "main")
            .await
            .unwrap();

        let entries = TreeReader::new(remote.clone())
            .list(&repo(), "docs", "main")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, DIRECTORY_MARKER);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[0].byte_size, 0);
    }

    #[tokio::test]
    async fn delete_sends_hash_and_branch() {
        let remote = Arc::new(MemoryRemote::new());
        let sha = remote.seed("main", "a.txt", b"a");

        writer(&remote)
            .delete_file(&repo(), "a.txt", &sha, "chore: delete a.txt", "main")
            .await
            .unwrap();

        let del = &remote.calls_with(Method::DELETE)[0];
        let body = del.body.as_ref().unwrap();
        assert_eq!(body["sha"], sha.as_str());
        assert_eq!(body["branch"], "main");
        assert_eq!(body["message"], "chore: delete a.txt");
        assert!(remote.paths("main").is_empty());
    }

    #[tokio::test]
    async fn delete_with_stale_hash_conflicts() {
        let remote = Arc::new(MemoryRemote::new());
        let old = remote.seed("main", "a.txt", b"a");
        remote.touch("main", "a.txt", b"b");

        let err = writer(&remote)
            .delete_file(&repo(), "a.txt", &old, "rm", "main")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(remote.paths("main"), ["a.txt"]);
    }
}
