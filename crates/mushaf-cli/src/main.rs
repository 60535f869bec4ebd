//! Mushaf CLI
//!
//! Command-line interface for Mushaf - Quran reading and word annotation.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mushaf_core::SyncCoordinator;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "mushaf")]
#[command(about = "Mushaf - Quran reader with word-level grammar annotations")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a surah (or continue from the saved position)
    Read {
        /// Surah number (1-114); defaults to the saved position
        surah: Option<u32>,
        /// Jump to a specific ayah
        #[arg(short, long)]
        ayah: Option<u32>,
        /// Advance to the next ayah from the saved position
        #[arg(long, conflicts_with_all = ["surah", "ayah", "prev"])]
        next: bool,
        /// Go back to the previous ayah from the saved position
        #[arg(long, conflicts_with_all = ["surah", "ayah"])]
        prev: bool,
    },
    /// Edit the grammar analysis of a word
    Edit {
        /// Surah number
        surah: u32,
        /// Ayah number
        ayah: u32,
        /// Word index within the ayah (0-based)
        word: u32,
        /// Word category, e.g. "Noun", "Verb"
        #[arg(long)]
        word_type: Option<String>,
        /// Triliteral root
        #[arg(long)]
        root: Option<String>,
        /// Explanation of the root's meaning
        #[arg(long)]
        root_explanation: Option<String>,
        /// Grammatical details
        #[arg(long)]
        grammar: Option<String>,
    },
    /// Set an alternate recitation URL for an ayah (local only)
    Media {
        /// Surah number
        surah: u32,
        /// Ayah number
        ayah: u32,
        /// Audio URL; pass "none" to clear
        url: String,
    },
    /// Retry queued edits against the remote backend
    Sync,
    /// Account management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show backend, cache, and pending-sync status
    Status,
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Sign in with email and password
    Signin {
        email: String,
        password: String,
    },
    /// Create an account
    Signup {
        email: String,
        password: String,
        /// Display name shown to other readers
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Sign out of the current session
    Signout,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, airtable_api_key, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the coordinator
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
        };
    }

    let mut coordinator = SyncCoordinator::open()?;

    match cli.command {
        Commands::Read {
            surah,
            ayah,
            next,
            prev,
        } => commands::read::run(&mut coordinator, surah, ayah, next, prev, &output).await,
        Commands::Edit {
            surah,
            ayah,
            word,
            word_type,
            root,
            root_explanation,
            grammar,
        } => {
            commands::edit::run(
                &mut coordinator,
                surah,
                ayah,
                word,
                commands::edit::AnalysisArgs {
                    word_type,
                    root,
                    root_explanation,
                    grammar,
                },
                &output,
            )
            .await
        }
        Commands::Media { surah, ayah, url } => {
            commands::media::run(&mut coordinator, surah, ayah, url, &output)
        }
        Commands::Sync => commands::sync::run(&mut coordinator, &output).await,
        Commands::Auth { command } => match command {
            AuthCommands::Signin { email, password } => {
                commands::auth::signin(&coordinator, &email, &password, &output).await
            }
            AuthCommands::Signup {
                email,
                password,
                display_name,
            } => {
                commands::auth::signup(
                    &coordinator,
                    &email,
                    &password,
                    display_name.as_deref(),
                    &output,
                )
                .await
            }
            AuthCommands::Signout => commands::auth::signout(&coordinator, &output).await,
        },
        Commands::Config { .. } => unreachable!(), // handled above
        Commands::Status => commands::status::show(&coordinator, &output),
    }
}
