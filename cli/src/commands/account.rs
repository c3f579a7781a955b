use repodeck::assist::{self, GeminiGenerator};
use repodeck::{NewRepository, RepoClient};
use serde_json::json;

use super::Session;
use crate::output::{print_rows, print_status, OutputFormat};

pub async fn whoami(client: &RepoClient, format: &OutputFormat) -> Result<(), String> {
    let user = client
        .account
        .whoami()
        .await
        .map_err(|e| format!("Failed to fetch account: {e}"))?;

    let columns = vec!["login".to_string(), "name".to_string(), "url".to_string()];
    let rows = vec![vec![
        user.login,
        user.name.unwrap_or_default(),
        user.html_url.unwrap_or_default(),
    ]];
    print_rows(&columns, &rows, format);
    Ok(())
}

pub async fn repos(client: &RepoClient, format: &OutputFormat) -> Result<(), String> {
    let repos = client
        .account
        .list_repositories()
        .await
        .map_err(|e| format!("Failed to list repositories: {e}"))?;

    let columns = vec![
        "repository".to_string(),
        "visibility".to_string(),
        "default_branch".to_string(),
        "language".to_string(),
        "updated_at".to_string(),
    ];
    let rows: Vec<Vec<String>> = repos
        .into_iter()
        .map(|r| {
            vec![
                r.full_name,
                if r.private { "private" } else { "public" }.to_string(),
                r.default_branch,
                r.language.unwrap_or_default(),
                r.updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();

    print_rows(&columns, &rows, format);
    Ok(())
}

pub async fn create_repo(
    client: &RepoClient,
    name: &str,
    description: Option<&str>,
    private: bool,
    readme: bool,
    generator: Option<&GeminiGenerator>,
    format: &OutputFormat,
) -> Result<(), String> {
    let new = NewRepository {
        name: name.to_string(),
        description: description.map(str::to_string),
        private,
    };
    let created = client
        .account
        .create_repository(&new)
        .await
        .map_err(|e| format!("Failed to create repository: {e}"))?;

    if readme {
        let body = match generator {
            Some(generator) => {
                assist::draft_readme(generator, name, description.unwrap_or_default(), &[]).await
            }
            None => format!("# {name}\n\n{}\n", description.unwrap_or_default()),
        };
        let repo = created.to_ref();
        client
            .writer
            .write_text(&repo, "README.md", &body, "docs: add README", &repo.default_branch)
            .await
            .map_err(|e| format!("Repository created but README write failed: {e}"))?;
    }

    print_status(
        format,
        &format!("created {}", created.full_name),
        json!({ "status": "ok", "repository": created.full_name, "url": created.html_url }),
    );
    Ok(())
}

pub async fn delete_repo(session: &Session, yes: bool, format: &OutputFormat) -> Result<(), String> {
    let full_name = session.repo.full_name();
    if !yes {
        return Err(format!("refusing to delete {full_name} without --yes"));
    }
    session
        .client
        .account
        .delete_repository(&session.repo)
        .await
        .map_err(|e| format!("Failed to delete {full_name}: {e}"))?;

    print_status(
        format,
        &format!("deleted {full_name}"),
        json!({ "status": "ok", "repository": full_name }),
    );
    Ok(())
}
