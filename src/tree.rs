/// Tree Reader: directory listings and file reads at a (path, branch).
use std::cmp::Ordering;
use std::sync::Arc;

use crate::codec;
use crate::error::{Error, Result};
use crate::model::{RepositoryRef, TreeEntry};
use crate::paths;
use crate::transport::{Method, Transport};
use crate::wire::{Contents, RawEntry};

#[derive(Clone)]
pub struct TreeReader {
    transport: Arc<dyn Transport>,
}

impl TreeReader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch whatever lives at `path` on `branch`, keeping the remote's shape.
    ///
    /// Errors, including 404, are returned as-is.
    pub async fn lookup(&self, repo: &RepositoryRef, path: &str, branch: &str) -> Result<Contents> {
        let endpoint = paths::contents_at_ref(repo, path, branch);
        let value = self.transport.call(&endpoint, Method::GET, None).await?;
        Contents::from_value(value)
    }

    /// List the entries at `path` (empty for the root), directories first,
    /// each group by name.
    ///
    /// A path the remote does not know on this branch lists as empty.
    pub async fn list(&self, repo: &RepositoryRef, path: &str, branch: &str) -> Result<Vec<TreeEntry>> {
        let contents = match self.lookup(repo, path, branch).await {
            Ok(contents) => contents,
            Err(e) if e.is_not_found() => {
                tracing::debug!(repo = %repo.full_name(), path, branch, "path not found, listing as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut entries: Vec<TreeEntry> = match contents {
            Contents::Many(raw) => raw.into_iter().map(TreeEntry::from).collect(),
            Contents::Single(raw) => vec![TreeEntry::from(raw)],
        };
        sort_entries(&mut entries);
        Ok(entries)
    }

    /// Raw bytes of the file at `path`.
    pub async fn get_bytes(&self, repo: &RepositoryRef, path: &str, branch: &str) -> Result<Vec<u8>> {
        match self.lookup(repo, path, branch).await? {
            Contents::Single(raw) => inline_payload(raw),
            Contents::Many(_) => Err(Error::IsDirectory {
                path: paths::normalize(path),
            }),
        }
    }

    /// File content as UTF-8 text.
    pub async fn get_content(&self, repo: &RepositoryRef, path: &str, branch: &str) -> Result<String> {
        let bytes = self.get_bytes(repo, path, branch).await?;
        String::from_utf8(bytes).map_err(|_| Error::InvalidText {
            path: paths::normalize(path),
        })
    }
}

fn inline_payload(raw: RawEntry) -> Result<Vec<u8>> {
    match (raw.encoding.as_deref(), raw.content.as_deref()) {
        (Some("base64"), Some(content)) => codec::decode(content),
        _ => Err(Error::UnsupportedEncoding {
            path: raw.path,
            encoding: raw.encoding,
        }),
    }
}

/// Directories before files; names compared case-insensitively, then by
/// raw bytes so the order is total.
pub fn sort_entries(entries: &mut [TreeEntry]) {
    entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| compare_names(&a.name, &b.name)));
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
