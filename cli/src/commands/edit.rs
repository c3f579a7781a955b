use std::path::Path;

use repodeck::assist::{self, GeminiGenerator, TextGenerator};
use repodeck::{paths, upload, TreeEntry};
use serde_json::json;

use super::Session;
use crate::output::{print_rows, print_status, OutputFormat};

pub async fn put(
    session: &Session,
    local: &str,
    remote: &str,
    message: Option<&str>,
    generator: Option<&GeminiGenerator>,
    extract: bool,
    format: &OutputFormat,
) -> Result<(), String> {
    // With --extract an archive is unpacked into REMOTE as a directory.
    if extract && upload::is_archive(Path::new(local)) {
        let written = extract_archive(session, Path::new(local), remote).await?;
        print_written(written, format);
        return Ok(());
    }

    let bytes = tokio::fs::read(local)
        .await
        .map_err(|e| format!("Failed to read {local}: {e}"))?;
    let name = paths::file_name(remote).to_string();

    let message = match (message, generator) {
        (Some(message), _) => message.to_string(),
        (None, Some(generator)) => {
            let preview = String::from_utf8_lossy(&bytes);
            assist::suggest_commit_message(generator, &name, &preview).await
        }
        (None, None) => format!("upload {name}"),
    };

    let entry = session
        .client
        .writer
        .write(&session.repo, remote, &bytes, &message, &session.branch)
        .await
        .map_err(|e| format!("Failed to write {remote}: {e}"))?;

    print_status(
        format,
        &format!("wrote {} ({})", entry.path, entry.content_hash),
        json!({ "status": "ok", "path": entry.path, "hash": entry.content_hash, "message": message }),
    );
    Ok(())
}

pub async fn upload(
    session: &Session,
    local_dir: &str,
    remote_dir: &str,
    generator: Option<&GeminiGenerator>,
    extract: bool,
    format: &OutputFormat,
) -> Result<(), String> {
    let files = upload::collect_local_files(Path::new(local_dir))
        .map_err(|e| format!("Failed to scan {local_dir}: {e}"))?;
    if files.is_empty() {
        return Err(format!("no files found under {local_dir}"));
    }

    let (archives, plain): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|f| extract && upload::is_archive(&f.local_path));

    let mut written = upload::upload_files(
        &session.client.writer,
        &session.repo,
        &plain,
        remote_dir,
        &session.branch,
        generator.map(|g| g as &dyn TextGenerator),
    )
    .await
    .map_err(|e| format!("Upload stopped: {e}"))?;

    // Each archive unpacks into the remote counterpart of its own directory.
    for archive in &archives {
        let target = paths::join(remote_dir, &paths::parent(&archive.relative_path));
        written.extend(extract_archive(session, &archive.local_path, &target).await?);
    }

    print_written(written, format);
    Ok(())
}

async fn extract_archive(
    session: &Session,
    archive: &Path,
    remote_dir: &str,
) -> Result<Vec<TreeEntry>, String> {
    upload::upload_archive(
        &session.client.writer,
        &session.repo,
        archive,
        remote_dir,
        &session.branch,
    )
    .await
    .map_err(|e| format!("Extraction of {} stopped: {e}", archive.display()))
}

fn print_written(written: Vec<TreeEntry>, format: &OutputFormat) {
    let columns = vec!["path".to_string(), "size".to_string(), "hash".to_string()];
    let rows: Vec<Vec<String>> = written
        .into_iter()
        .map(|e| vec![e.path, e.byte_size.to_string(), e.content_hash])
        .collect();
    print_rows(&columns, &rows, format);
}

pub async fn mkdir(
    session: &Session,
    path: &str,
    message: Option<&str>,
    format: &OutputFormat,
) -> Result<(), String> {
    let message = message.unwrap_or("chore: create directory");
    let entry = session
        .client
        .writer
        .create_directory_marker(&session.repo, path, message, &session.branch)
        .await
        .map_err(|e| format!("Failed to create {path}: {e}"))?;

    print_status(
        format,
        &format!("created {}", paths::parent(&entry.path)),
        json!({ "status": "ok", "marker": entry.path }),
    );
    Ok(())
}

pub async fn rm(session: &Session, path: &str, yes: bool, format: &OutputFormat) -> Result<(), String> {
    if !yes {
        return Err(format!(
            "refusing to delete {path} and everything under it without --yes"
        ));
    }
    let deleted = session
        .client
        .deleter
        .delete_subtree(&session.repo, path, &session.branch)
        .await
        .map_err(|e| format!("Delete stopped: {e} (re-run to finish)"))?;

    print_status(
        format,
        &format!("deleted {deleted} file(s) under {path}"),
        json!({ "status": "ok", "path": path, "deleted": deleted }),
    );
    Ok(())
}
