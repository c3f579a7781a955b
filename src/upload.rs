/// Bulk upload of a local directory or zip archive through the File Writer.
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::assist::{self, TextGenerator};
use crate::error::{Error, Result};
use crate::model::{RepositoryRef, TreeEntry};
use crate::paths;
use crate::writer::FileWriter;

/// A local file and where it lands relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub local_path: PathBuf,
    /// Slash-separated, relative to the walked root.
    pub relative_path: String,
}

/// Every regular file under `root`, skipping `.git`, sorted by relative path.
pub fn collect_local_files(root: &Path) -> Result<Vec<LocalFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::InvalidPath(e.to_string()))?;
        let relative_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(LocalFile {
            local_path: entry.path().to_path_buf(),
            relative_path,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

/// Write each file under `remote_dir`, one at a time.
///
/// Each write does its own read-before-write, so re-uploading over existing
/// files replaces them. The first failure stops the upload and is returned;
/// files written before it stay written.
pub async fn upload_files(
    writer: &FileWriter,
    repo: &RepositoryRef,
    files: &[LocalFile],
    remote_dir: &str,
    branch: &str,
    generator: Option<&dyn TextGenerator>,
) -> Result<Vec<TreeEntry>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let bytes = tokio::fs::read(&file.local_path).await?;
        let target = paths::join(remote_dir, &file.relative_path);
        let name = paths::file_name(&target).to_string();

        let message = match generator {
            Some(generator) if assist::wants_generated_message(&name, bytes.len() as u64) => {
                let preview = String::from_utf8_lossy(&bytes);
                assist::suggest_commit_message(generator, &name, &preview).await
            }
            _ => format!("upload {name}"),
        };

        let entry = writer.write(repo, &target, &bytes, &message, branch).await?;
        tracing::debug!(path = %entry.path, "uploaded");
        written.push(entry);
    }
    tracing::info!(repo = %repo.full_name(), branch, files = written.len(), "upload finished");
    Ok(written)
}

/// True for paths that `upload_archive` can extract.
pub fn is_archive(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Extract a local zip archive into `remote_dir`, one entry at a time.
///
/// Directory entries are skipped; each file entry is written with the
/// message `chore: upload extracted <path>`. Entries whose names would
/// escape the archive root are rejected before anything is written. The
/// first failed write stops the extraction.
pub async fn upload_archive(
    writer: &FileWriter,
    repo: &RepositoryRef,
    archive_path: &Path,
    remote_dir: &str,
    branch: &str,
) -> Result<Vec<TreeEntry>> {
    let data = tokio::fs::read(archive_path).await?;
    let entries = read_archive(data)?;

    let mut written = Vec::with_capacity(entries.len());
    for (relative_path, bytes) in entries {
        let target = paths::join(remote_dir, &relative_path);
        let message = format!("chore: upload extracted {target}");
        let entry = writer.write(repo, &target, &bytes, &message, branch).await?;
        tracing::debug!(path = %entry.path, "extracted");
        written.push(entry);
    }
    tracing::info!(
        repo = %repo.full_name(),
        branch,
        archive = %archive_path.display(),
        files = written.len(),
        "archive extracted"
    );
    Ok(written)
}

/// File entries of a zip archive in archive order, as (relative path, bytes).
fn read_archive(data: Vec<u8>) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).map_err(|e| Error::Archive(e.to_string()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| Error::Archive(e.to_string()))?;
        if file.is_dir() {
            continue;
        }
        let name = file
            .enclosed_name()
            .ok_or_else(|| Error::InvalidPath(file.name().to_string()))?;
        let relative_path = name
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        if relative_path.is_empty() {
            continue;
        }

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::Archive(format!("{relative_path}: {e}")))?;
        entries.push((relative_path, bytes));
    }
    Ok(entries)
}
