//! Tripdesk CLI and REST/WebSocket API entry point.
//!
//! Binary name: `tdesk`
//!
//! Parses CLI arguments, initializes database and services, then
//! dispatches to the appropriate command handler or starts the server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The server gets the full observability stack; one-shot CLI commands
    // get a plain fmt subscriber driven by verbosity flags.
    if let Commands::Serve { otel, .. } = &cli.command {
        tripdesk_observe::tracing_setup::init_tracing(*otel)
            .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    } else {
        let filter = match cli.verbose {
            0 if cli.quiet => "error",
            0 => "warn",
            1 => "info,tripdesk=debug",
            _ => "trace",
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(false)
            .init();
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "tdesk", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, services, room registry)
    let state = AppState::init().await?;

    match cli.command {
        Commands::CreateUser {
            username,
            email,
            full_name,
            admin,
        } => {
            cli::user::create_user(&state, username, email, full_name, admin, cli.json).await?;
        }

        Commands::ListSessions { limit } => {
            cli::session::list_sessions(&state, limit, cli.json).await?;
        }

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Serve { port, host, .. } => {
            let host = host.unwrap_or_else(|| state.config.host.clone());
            let port = port.unwrap_or(state.config.port);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Tripdesk API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {} Chat socket at {}",
                console::style("💬").bold(),
                console::style(format!("ws://{addr}/ws/chat")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let shutdown = state.shutdown.clone();
            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    // Tell live chat connections to close their sockets.
                    shutdown.cancel();
                })
                .await?;

            tripdesk_observe::tracing_setup::shutdown_tracing();
            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
