pub mod account;
pub mod browse;
pub mod edit;

use repodeck::assist::GeminiGenerator;
use repodeck::transport::DEFAULT_API_BASE;
use repodeck::{Credential, RepoClient, RepositoryRef};

use crate::config::{self, Profile};
use crate::output::OutputFormat;

pub enum Command {
    Whoami,
    Repos,
    CreateRepo {
        name: String,
        description: Option<String>,
        private: bool,
        readme: bool,
    },
    DeleteRepo {
        yes: bool,
    },
    Branches,
    Log {
        limit: usize,
    },
    Ls {
        path: Option<String>,
    },
    Cat {
        path: String,
    },
    Download {
        path: String,
        dest: String,
    },
    Put {
        local: String,
        remote: String,
        message: Option<String>,
        ai_message: bool,
        extract: bool,
    },
    Upload {
        local_dir: String,
        remote_dir: Option<String>,
        ai_message: bool,
        extract: bool,
    },
    Mkdir {
        path: String,
        message: Option<String>,
    },
    Rm {
        path: String,
        yes: bool,
    },
    Explain {
        path: String,
    },
}

/// Values given on the command line; these win over config and environment.
#[derive(Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
}

/// A selected repository and the branch commands operate on.
pub struct Session {
    pub client: RepoClient,
    pub repo: RepositoryRef,
    pub branch: String,
}

pub async fn run(
    command: Command,
    profile_name: &str,
    overrides: &Overrides,
    format: &OutputFormat,
) -> Result<(), String> {
    let mut profile = config::load_config(profile_name);
    profile.merge(&Profile {
        token: overrides.token.clone(),
        api_base: overrides.api_base.clone(),
        repo: overrides.repo.clone(),
        branch: overrides.branch.clone(),
        ..Default::default()
    });

    let client = connect(&profile)?;

    match command {
        Command::Whoami => account::whoami(&client, format).await,
        Command::Repos => account::repos(&client, format).await,
        Command::CreateRepo {
            name,
            description,
            private,
            readme,
        } => {
            let generator = generator(&profile);
            account::create_repo(
                &client,
                &name,
                description.as_deref(),
                private,
                readme,
                generator.as_ref(),
                format,
            )
            .await
        }
        command => {
            let session = open_session(client, &profile).await?;
            run_in_session(command, &session, &profile, format).await
        }
    }
}

async fn run_in_session(
    command: Command,
    session: &Session,
    profile: &Profile,
    format: &OutputFormat,
) -> Result<(), String> {
    match command {
        Command::DeleteRepo { yes } => account::delete_repo(session, yes, format).await,
        Command::Branches => browse::branches(session, format).await,
        Command::Log { limit } => browse::log(session, limit, format).await,
        Command::Ls { path } => browse::ls(session, path.as_deref().unwrap_or(""), format).await,
        Command::Cat { path } => browse::cat(session, &path).await,
        Command::Download { path, dest } => browse::download(session, &path, &dest, format).await,
        Command::Explain { path } => {
            let generator = generator(profile).ok_or_else(missing_generator)?;
            browse::explain(session, &path, &generator).await
        }
        Command::Put {
            local,
            remote,
            message,
            ai_message,
            extract,
        } => {
            let generator = if ai_message { generator(profile) } else { None };
            edit::put(
                session,
                &local,
                &remote,
                message.as_deref(),
                generator.as_ref(),
                extract,
                format,
            )
            .await
        }
        Command::Upload {
            local_dir,
            remote_dir,
            ai_message,
            extract,
        } => {
            let generator = if ai_message { generator(profile) } else { None };
            edit::upload(
                session,
                &local_dir,
                remote_dir.as_deref().unwrap_or(""),
                generator.as_ref(),
                extract,
                format,
            )
            .await
        }
        Command::Mkdir { path, message } => {
            edit::mkdir(session, &path, message.as_deref(), format).await
        }
        Command::Rm { path, yes } => edit::rm(session, &path, yes, format).await,
        Command::Whoami | Command::Repos | Command::CreateRepo { .. } => {
            Err("command does not take a repository".to_string())
        }
    }
}

fn connect(profile: &Profile) -> Result<RepoClient, String> {
    let token = profile.token.as_deref().ok_or(
        "no token configured: set REPODECK_TOKEN or GITHUB_TOKEN, pass --token, or add `token` to the config file",
    )?;
    let api_base = profile.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
    Ok(RepoClient::connect(Credential::new(token), api_base))
}

async fn open_session(client: RepoClient, profile: &Profile) -> Result<Session, String> {
    let full_name = profile
        .repo
        .as_deref()
        .ok_or("no repository selected: pass --repo owner/name or set `repo` in the config file")?;
    let (owner, name) = parse_repo(full_name)?;

    let repository = client
        .account
        .get_repository(owner, name)
        .await
        .map_err(|e| format!("Failed to open {full_name}: {e}"))?;
    let repo = repository.to_ref();

    let branch = match &profile.branch {
        Some(branch) => branch.clone(),
        None => client.inspector.resolve_branch(&repo).await,
    };
    tracing::debug!(repo = %repo.full_name(), %branch, "session opened");

    Ok(Session {
        client,
        repo,
        branch,
    })
}

fn generator(profile: &Profile) -> Option<GeminiGenerator> {
    let key = profile.gemini_api_key.as_deref()?;
    let generator = GeminiGenerator::new(key);
    Some(match &profile.gemini_model {
        Some(model) => generator.with_model(model),
        None => generator,
    })
}

fn missing_generator() -> String {
    "no Gemini API key: set GEMINI_API_KEY or `gemini_api_key` in the config file".to_string()
}

/// Split `owner/name`.
pub fn parse_repo(full_name: &str) -> Result<(&str, &str), String> {
    match full_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(format!("expected owner/name, got '{full_name}'")),
    }
}
