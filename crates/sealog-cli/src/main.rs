//! Sealog CLI - Tamper-evident event log.
//!
//! Append events, inspect sessions, verify integrity, and replay recorded
//! model interactions from the command line.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config_bridge;
mod context;
mod theme;

use commands::{events, keys, replay, verify};
use context::App;

/// Sealog - tamper-evident event log
#[derive(Parser)]
#[command(name = "sealog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Path to configuration file (default: ./sealog.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// HMAC key as hex, overriding the key file
    #[arg(long, global = true, env = "SEALOG_HMAC_KEY", hide_env_values = true)]
    hmac_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable tables.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Append an event
    Append {
        /// Event type tag, e.g. `llm_interaction`
        event_type: String,

        /// Payload as a JSON object
        #[arg(short, long, default_value = "{}")]
        payload: String,

        /// Session to append to (a new session is started if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// List recorded sessions
    Sessions,

    /// Show the events of a session
    Show {
        /// Session ID (omit if using --last)
        session: Option<String>,
        /// Use the most recently active session
        #[arg(long)]
        last: bool,
    },

    /// Verify stored hashes
    Verify {
        /// Session ID (all sessions if omitted)
        session: Option<String>,
    },

    /// Analyze a recorded session
    Replay {
        #[command(subcommand)]
        command: ReplayCommands,
    },

    /// Manage the HMAC key
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand)]
enum ReplayCommands {
    /// Model calls in order
    Timeline {
        /// Session ID (omit if using --last)
        session: Option<String>,
        /// Use the most recently active session
        #[arg(long)]
        last: bool,
    },
    /// Aggregate session metrics
    Metrics {
        /// Session ID (omit if using --last)
        session: Option<String>,
        /// Use the most recently active session
        #[arg(long)]
        last: bool,
    },
    /// Latency outliers
    Anomalies {
        /// Session ID (omit if using --last)
        session: Option<String>,
        /// Use the most recently active session
        #[arg(long)]
        last: bool,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Show the key ID and key file location
    Show,
    /// Generate a new key
    Generate {
        /// Replace an existing key
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = sealog_config::load(cli.config.as_deref())?;

    let mut log_config = config_bridge::to_log_config(&config)?;
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = sealog_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let app = App::new(config, cli.format, cli.hmac_key);

    match cli.command {
        Commands::Append {
            event_type,
            payload,
            session,
        } => events::append(&app, &event_type, &payload, session.as_deref()),
        Commands::Sessions => events::list_sessions(&app),
        Commands::Show { session, last } => {
            let session_id = app.resolve_session(session.as_deref(), last)?;
            events::show_session(&app, &session_id)
        },
        Commands::Verify { session } => verify::verify(&app, session.as_deref()),
        Commands::Replay { command } => handle_replay(&app, command),
        Commands::Keys { command } => handle_keys(&app, &command),
    }
}

fn handle_replay(app: &App, command: ReplayCommands) -> Result<()> {
    match command {
        ReplayCommands::Timeline { session, last } => {
            let session_id = app.resolve_session(session.as_deref(), last)?;
            replay::timeline(app, &session_id)
        },
        ReplayCommands::Metrics { session, last } => {
            let session_id = app.resolve_session(session.as_deref(), last)?;
            replay::metrics(app, &session_id)
        },
        ReplayCommands::Anomalies { session, last } => {
            let session_id = app.resolve_session(session.as_deref(), last)?;
            replay::anomalies(app, &session_id)
        },
    }
}

fn handle_keys(app: &App, command: &KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Show => keys::show_key(app),
        KeyCommands::Generate { force } => keys::generate_key(app, *force),
    }
}
