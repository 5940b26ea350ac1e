//! `Postline` - command-line client for a bearer-token messaging backend.
//!
//! The terminal plays the host screen: notices go to stderr (and optionally
//! the desktop), and an expired session ends the run with a login hint.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod host;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postline_auth::{KeyringStore, clear_login, store_login};
use postline_core::{Config, HttpApi, MessageSession, OutgoingDraft, Outcome, SessionGuard};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use host::TerminalHost;

/// Read and send messages from the terminal.
#[derive(Parser)]
#[command(name = "postline")]
#[command(version)]
#[command(about = "Read and send messages from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also show notices as desktop notifications
    #[arg(long, global = true)]
    desktop: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the token returned by the backend's login
    Login {
        /// Username the token was issued to
        #[arg(long)]
        username: String,
        /// Bearer token
        #[arg(long, env = "POSTLINE_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Forget the stored login
    Logout,

    /// Show the inbox
    Inbox,

    /// Send a message
    Send {
        /// Receiver username
        #[arg(long)]
        to: String,
        /// Subject line
        #[arg(long)]
        subject: String,
        /// Message body
        #[arg(long)]
        message: String,
    },

    /// Print the effective configuration
    Config {
        /// Write the file settings, with defaults filled in, back to the
        /// config file (environment overrides are not saved)
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "postline=info,postline_core=info,postline_auth=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_with_env(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let store = Arc::new(KeyringStore::new(config.keyring_service.clone()));

    match cli.command {
        Commands::Login { username, token } => {
            let credential = store_login(store.as_ref(), &username, &token)
                .context("Failed to store login")?;
            match credential.expires_at {
                Some(exp) => info!("Logged in as {username}, token expires {exp}"),
                None => info!("Logged in as {username}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logout => {
            clear_login(store.as_ref()).context("Failed to clear login")?;
            info!("Logged out");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inbox => {
            let host = Arc::new(TerminalHost::new(cli.desktop));
            let session = open_session(&config, store, &host)?;

            let outcome = session.activate().await;
            if outcome.is_completed() {
                print!("{}", render::inbox_local(&session.messages()));
            }
            Ok(exit_code(&outcome, &host))
        }
        Commands::Send {
            to,
            subject,
            message,
        } => {
            let host = Arc::new(TerminalHost::new(cli.desktop));
            let session = open_session(&config, store, &host)?;

            let opened = session.activate().await;
            if matches!(opened, Outcome::SessionExpired) {
                return Ok(exit_code(&opened, &host));
            }

            let mut draft = OutgoingDraft::new(subject, message, to);
            let outcome = session.send_message(&mut draft).await;
            if outcome.is_completed() {
                info!("Inbox now holds {} messages", session.messages().len());
            }
            Ok(exit_code(&outcome, &host))
        }
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                Config::write_file_settings(&config_path).await?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_session(
    config: &Config,
    store: Arc<KeyringStore>,
    host: &Arc<TerminalHost>,
) -> Result<MessageSession<HttpApi, KeyringStore>> {
    let api = HttpApi::new(config).context("Failed to build HTTP client")?;
    let guard = SessionGuard::new(store, host.clone()).with_leeway(config.expiry_leeway());
    Ok(MessageSession::new(api, guard, host.clone()))
}

fn exit_code(outcome: &Outcome, host: &TerminalHost) -> ExitCode {
    if host.was_redirected() {
        return ExitCode::from(2);
    }
    if outcome.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
