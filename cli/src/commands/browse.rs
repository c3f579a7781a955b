use repodeck::assist::{self, GeminiGenerator};
use repodeck::paths;
use serde_json::json;

use super::Session;
use crate::output::{print_rows, print_status, OutputFormat};

pub async fn branches(session: &Session, format: &OutputFormat) -> Result<(), String> {
    let branches = session
        .client
        .inspector
        .list_branches(&session.repo)
        .await
        .map_err(|e| format!("Failed to list branches: {e}"))?;

    let columns = vec![
        "branch".to_string(),
        "head".to_string(),
        "protected".to_string(),
        "current".to_string(),
    ];
    let rows: Vec<Vec<String>> = branches
        .into_iter()
        .map(|b| {
            let current = if b.name == session.branch { "*" } else { "" };
            vec![
                b.name,
                short_hash(&b.head_commit_hash),
                b.is_protected.to_string(),
                current.to_string(),
            ]
        })
        .collect();
    print_rows(&columns, &rows, format);
    Ok(())
}

pub async fn log(session: &Session, limit: usize, format: &OutputFormat) -> Result<(), String> {
    let commits = session
        .client
        .inspector
        .list_commits(&session.repo, &session.branch, limit)
        .await
        .map_err(|e| format!("Failed to list commits: {e}"))?;

    let columns = vec![
        "commit".to_string(),
        "author".to_string(),
        "date".to_string(),
        "message".to_string(),
    ];
    let rows: Vec<Vec<String>> = commits
        .iter()
        .map(|c| {
            vec![
                short_hash(&c.hash),
                c.author_name.clone(),
                c.author_timestamp.format("%Y-%m-%d %H:%M").to_string(),
                c.summary().to_string(),
            ]
        })
        .collect();
    print_rows(&columns, &rows, format);
    Ok(())
}

pub async fn ls(session: &Session, path: &str, format: &OutputFormat) -> Result<(), String> {
    let entries = session
        .client
        .tree
        .list(&session.repo, path, &session.branch)
        .await
        .map_err(|e| format!("Failed to list {}: {e}", display_path(path)))?;

    let columns = vec![
        "type".to_string(),
        "name".to_string(),
        "size".to_string(),
        "hash".to_string(),
    ];
    let rows: Vec<Vec<String>> = entries
        .into_iter()
        .map(|e| {
            let size = if e.is_dir() {
                String::new()
            } else {
                e.byte_size.to_string()
            };
            vec![
                e.kind.as_str().to_string(),
                e.name,
                size,
                short_hash(&e.content_hash),
            ]
        })
        .collect();
    print_rows(&columns, &rows, format);
    Ok(())
}

pub async fn cat(session: &Session, path: &str) -> Result<(), String> {
    let text = session
        .client
        .tree
        .get_content(&session.repo, path, &session.branch)
        .await
        .map_err(|e| format!("Failed to read {path}: {e}"))?;
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub async fn download(
    session: &Session,
    path: &str,
    dest: &str,
    format: &OutputFormat,
) -> Result<(), String> {
    let bytes = session
        .client
        .tree
        .get_bytes(&session.repo, path, &session.branch)
        .await
        .map_err(|e| format!("Failed to read {path}: {e}"))?;

    // A destination directory receives the file under its remote name.
    let mut target = std::path::PathBuf::from(dest);
    if target.is_dir() {
        target.push(paths::file_name(path));
    }
    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|e| format!("Failed to write {}: {e}", target.display()))?;

    print_status(
        format,
        &format!("downloaded {path} -> {} ({} bytes)", target.display(), bytes.len()),
        json!({ "status": "ok", "path": path, "dest": target.display().to_string(), "bytes": bytes.len() }),
    );
    Ok(())
}

pub async fn explain(
    session: &Session,
    path: &str,
    generator: &GeminiGenerator,
) -> Result<(), String> {
    let code = session
        .client
        .tree
        .get_content(&session.repo, path, &session.branch)
        .await
        .map_err(|e| format!("Failed to read {path}: {e}"))?;
    let explanation = assist::explain_code(generator, paths::file_name(path), &code).await;
    println!("{explanation}");
    Ok(())
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(7).collect()
}

fn display_path(path: &str) -> String {
    let path = paths::normalize(path);
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}
