//! CLI command definitions and dispatch for the `tdesk` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! verb-noun pattern (e.g., `tdesk create-user`, `tdesk list-sessions`).

pub mod session;
pub mod status;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Travel-agency support-chat backend.
#[derive(Parser)]
#[command(name = "tdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API and WebSocket server.
    Serve {
        /// Port to listen on (overrides config.toml).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind (overrides config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Bridge tracing spans to OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Create an account (password prompted interactively).
    #[command(name = "create-user")]
    CreateUser {
        /// Login name, unique.
        username: String,

        /// Email address, unique.
        email: String,

        /// Display name shown next to chat messages.
        #[arg(long)]
        full_name: Option<String>,

        /// Grant administrator privilege (joins the shared admins' room).
        #[arg(long)]
        admin: bool,
    },

    /// List active chat sessions by last activity.
    #[command(name = "list-sessions", alias = "ls")]
    ListSessions {
        /// Maximum number of sessions to show.
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },

    /// Show system status.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
