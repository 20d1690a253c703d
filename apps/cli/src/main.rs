//! qnlink CLI - signed links and downloads for object storage
//!
//! Builds authorized download links and timestamp anti-leech links, and
//! fetches resources to local files.

mod commands;
mod output;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// qnlink - signed links for object storage
#[derive(Parser)]
#[command(name = "qnlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file
    #[arg(long, env = "QNLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Access key (overrides the settings file)
    #[arg(long, env = "QNLINK_ACCESS_KEY", hide_env_values = true)]
    access_key: Option<String>,

    /// Secret key (overrides the settings file)
    #[arg(long, env = "QNLINK_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Output format
    #[arg(long, default_value = "human")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an authorized download link for a private resource
    Sign {
        /// Resource URL
        url: String,

        /// Seconds the link stays valid
        #[arg(short, long)]
        expires: Option<i64>,
    },

    /// Create a timestamp anti-leech link
    AntiLeech {
        /// Resource URL
        url: String,

        /// Anti-leech key configured for the domain
        #[arg(short, long, env = "QNLINK_ANTI_LEECH_KEY", hide_env_values = true)]
        key: String,

        /// Seconds the link stays valid
        #[arg(short, long, conflicts_with = "deadline")]
        expires: Option<i64>,

        /// Absolute expiry (RFC 3339, e.g. 2030-01-01T00:00:00+08:00)
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Compute or decode expiry timestamps
    Timestamp {
        /// Seconds from now
        #[arg(short, long, allow_negative_numbers = true, conflicts_with = "decode")]
        after: Option<i64>,

        /// Timestamp to turn back into a local date and time
        #[arg(short, long)]
        decode: Option<String>,
    },

    /// Download a URL to a local file
    Download {
        /// URL to download
        url: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Sign the URL with the configured credentials first
        #[arg(short, long)]
        sign: bool,

        /// Seconds the signed link stays valid
        #[arg(short, long, requires = "sign")]
        expires: Option<i64>,
    },

    /// Show/update settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key
        key: String,

        /// Config value
        value: String,
    },

    /// Show all config
    Show,

    /// Reset to defaults
    Reset,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(qnlink_core::default_config_path);

    tracing::debug!("Using settings from {}", config_path.display());
    let mut settings = qnlink_core::ConfigStore::new(&config_path).load().await?;
    if let Some(access_key) = cli.access_key {
        settings.access_key = access_key;
    }
    if let Some(secret_key) = cli.secret_key {
        settings.secret_key = secret_key;
    }
    let core = qnlink_core::QnlinkCore::new(settings);

    match cli.command {
        Commands::Sign { url, expires } => commands::sign_url(&core, &url, expires, cli.output)?,

        Commands::AntiLeech {
            url,
            key,
            expires,
            deadline,
        } => commands::anti_leech_url(&core, &url, &key, expires, deadline, cli.output)?,

        Commands::Timestamp { after, decode } => {
            commands::timestamp(&core, after, decode, cli.output)?
        }

        Commands::Download {
            url,
            output,
            sign,
            expires,
        } => commands::download(&core, &url, output, sign, expires, cli.output).await?,

        Commands::Config { action } => {
            commands::config_action(&config_path, action, cli.output).await?
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(shell, &mut Cli::command(), "qnlink", &mut std::io::stdout());
        }
    }

    Ok(())
}
