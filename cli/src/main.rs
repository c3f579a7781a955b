mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use output::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repodeck", version, about = "Browse and edit remote repositories without cloning")]
struct Cli {
    /// Config profile to use
    #[arg(long, global = true, default_value = "default")]
    profile: String,

    /// API token (overrides config and environment)
    #[arg(long, global = true)]
    token: Option<String>,

    /// API base URL (overrides config)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Repository as owner/name
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Branch to operate on (defaults to the repository's default branch)
    #[arg(long, global = true)]
    branch: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Show the authenticated account
    Whoami,

    /// List repositories, most recently updated first
    Repos,

    /// Create a repository
    CreateRepo {
        /// Repository name
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        private: bool,

        /// Write a README.md after creation (drafted by Gemini when configured)
        #[arg(long)]
        readme: bool,
    },

    /// Delete the selected repository
    DeleteRepo {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// List branches
    Branches,

    /// Show recent commits on the branch
    Log {
        /// Maximum number of commits (1-100)
        #[arg(long, default_value = "30")]
        limit: usize,
    },

    /// List a directory (the root by default)
    Ls {
        path: Option<String>,
    },

    /// Print a text file
    Cat {
        path: String,
    },

    /// Save a remote file locally
    Download {
        path: String,

        /// Local file or directory
        dest: String,
    },

    /// Create or replace one remote file from a local file
    Put {
        local: String,
        remote: String,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Generate the commit message with Gemini
        #[arg(long)]
        ai_message: bool,

        /// Unpack a .zip LOCAL into the REMOTE directory
        #[arg(long)]
        extract: bool,
    },

    /// Upload every file under a local directory
    Upload {
        local_dir: String,

        /// Remote directory (the root by default)
        remote_dir: Option<String>,

        /// Generate commit messages for small scripts with Gemini
        #[arg(long)]
        ai_message: bool,

        /// Unpack .zip files in place instead of uploading them as-is
        #[arg(long)]
        extract: bool,
    },

    /// Create a directory by writing a .gitkeep marker
    Mkdir {
        path: String,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Delete a file or everything under a directory
    Rm {
        path: String,

        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Explain a file with Gemini
    Explain {
        path: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        CliCommand::Whoami => commands::Command::Whoami,
        CliCommand::Repos => commands::Command::Repos,
        CliCommand::CreateRepo {
            name,
            description,
            private,
            readme,
        } => commands::Command::CreateRepo {
            name,
            description,
            private,
            readme,
        },
        CliCommand::DeleteRepo { yes } => commands::Command::DeleteRepo { yes },
        CliCommand::Branches => commands::Command::Branches,
        CliCommand::Log { limit } => commands::Command::Log { limit },
        CliCommand::Ls { path } => commands::Command::Ls { path },
        CliCommand::Cat { path } => commands::Command::Cat { path },
        CliCommand::Download { path, dest } => commands::Command::Download { path, dest },
        CliCommand::Put {
            local,
            remote,
            message,
            ai_message,
            extract,
        } => commands::Command::Put {
            local,
            remote,
            message,
            ai_message,
            extract,
        },
        CliCommand::Upload {
            local_dir,
            remote_dir,
            ai_message,
            extract,
        } => commands::Command::Upload {
            local_dir,
            remote_dir,
            ai_message,
            extract,
        },
        CliCommand::Mkdir { path, message } => commands::Command::Mkdir { path, message },
        CliCommand::Rm { path, yes } => commands::Command::Rm { path, yes },
        CliCommand::Explain { path } => commands::Command::Explain { path },
    };

    let overrides = commands::Overrides {
        token: cli.token,
        api_base: cli.api_base,
        repo: cli.repo,
        branch: cli.branch,
    };

    if let Err(e) = commands::run(command, &cli.profile, &overrides, &cli.format).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
