/// Recursive Deleter: remove every file under a path, depth-first.
///
/// Directories are only shared path prefixes on the remote, so there is no
/// directory delete call; a directory disappears with its last file. Each
/// file is deleted with the hash from the listing taken in the same walk,
/// one call at a time. The first failure stops the walk and is returned;
/// files already removed stay removed. Re-running the walk lists what is
/// left and finishes the job.
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{Error, Result};
use crate::model::{EntryKind, RepositoryRef};
use crate::paths;
use crate::transport::Transport;
use crate::tree::TreeReader;
use crate::writer::FileWriter;

#[derive(Clone)]
pub struct RecursiveDeleter {
    reader: TreeReader,
    writer: FileWriter,
}

impl RecursiveDeleter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            reader: TreeReader::new(transport.clone()),
            writer: FileWriter::new(transport),
        }
    }

    /// Delete `path` and everything below it on `branch`. Returns the number
    /// of files removed. A path naming a single file removes just that file;
    /// a path that does not exist removes nothing.
    pub async fn delete_subtree(
        &self,
        repo: &RepositoryRef,
        path: &str,
        branch: &str,
    ) -> Result<usize> {
        let path = paths::normalize(path);
        if path.is_empty() {
            return Err(Error::InvalidPath(
                "refusing to delete the repository root".to_string(),
            ));
        }
        let deleted = self.walk(repo, path.clone(), branch).await?;
        tracing::info!(repo = %repo.full_name(), path = %path, branch, deleted, "deleted subtree");
        Ok(deleted)
    }

    fn walk<'a>(
        &'a self,
        repo: &'a RepositoryRef,
        path: String,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<usize>> {
        async move {
            let entries = self.reader.list(repo, &path, branch).await?;
            let mut deleted = 0;
            // Listing order puts directories first, so subtrees go before
            // the files beside them.
            for entry in entries {
                match entry.kind {
                    EntryKind::Directory => {
                        deleted += self.walk(repo, entry.path, branch).await?;
                    }
                    EntryKind::File => {
                        let message = format!("chore: delete {}", entry.path);
                        self.writer
                            .delete_file(repo, &entry.path, &entry.content_hash, &message, branch)
                            .await?;
                        deleted += 1;
                    }
                }
            }
            Ok(deleted)
        }
        .boxed()
    }
}
