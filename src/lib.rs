//! Client for a hosted source-control API: browse, edit and prune the file
//! tree of a remote repository branch without a local clone.
//!
//! Every write proves which version it replaces by sending that version's
//! content hash; a stale hash surfaces as [`Error::Conflict`].

pub mod assist;
pub mod codec;
pub mod deleter;
pub mod error;
pub mod inspect;
pub mod model;
pub mod paths;
pub mod repos;
pub mod transport;
pub mod tree;
pub mod upload;
pub mod wire;
pub mod writer;

#[cfg(test)]
mod test_remote;

use std::sync::Arc;

pub use deleter::RecursiveDeleter;
pub use error::{Error, Result};
pub use inspect::Inspector;
pub use model::{
    Branch, Commit, EntryKind, NewRepository, Repository, RepositoryRef, TreeEntry, User,
};
pub use repos::Account;
pub use transport::{Credential, HttpTransport, Transport};
pub use tree::TreeReader;
pub use writer::FileWriter;

/// All remote operations over one shared transport.
#[derive(Clone)]
pub struct RepoClient {
    pub account: Account,
    pub tree: TreeReader,
    pub writer: FileWriter,
    pub deleter: RecursiveDeleter,
    pub inspector: Inspector,
}

impl RepoClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            account: Account::new(transport.clone()),
            tree: TreeReader::new(transport.clone()),
            writer: FileWriter::new(transport.clone()),
            deleter: RecursiveDeleter::new(transport.clone()),
            inspector: Inspector::new(transport),
        }
    }

    /// Connect over HTTPS to `base_url` with `credential`.
    pub fn connect(credential: Credential, base_url: &str) -> Self {
        Self::new(Arc::new(HttpTransport::with_base_url(credential, base_url)))
    }
}
