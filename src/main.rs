use std::{env, net::SocketAddr, path::Path, process::ExitCode, sync::Arc};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod assets;
mod cli;
mod config;
mod content;
mod error;
mod handlers;
mod routes;
mod state;

use assets::ASSETS;
use cli::Args;
use config::Config;
use content::LocalContent;
use state::AppState;

// --- Main Application ---
#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Everything is checked before the listener opens.
    let config = match args.raw_config().validate() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}. Exiting.", e);
            eprintln!("Error: {}", e);
            eprintln!("Use -h or --help for usage.");
            return ExitCode::from(2);
        }
    };

    log_sharing_summary(&config);

    let bind_addr = SocketAddr::new(args.bind, config.port);
    let shared_state = AppState::new(config, Arc::new(LocalContent), &ASSETS);
    let app = routes::app(shared_state);

    let listener = match TcpListener::bind(bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_addr, e);
            eprintln!("Error: Failed to bind to address {}: {}", bind_addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Listening on: {}", bind_addr);
    info!("Local: http://127.0.0.1:{}", bind_addr.port());
    info!("Press Ctrl+C to stop the server");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        error!("Server error: {}", e);
        eprintln!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "raindrop=debug,tower_http=debug"
    } else {
        "raindrop=info,tower_http=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

/// Logs what this run is sharing, with paths relative to the working
/// directory where possible.
fn log_sharing_summary(config: &Config) {
    let cwd = env::current_dir().ok();
    let relative = |path: &Path| -> String {
        cwd.as_deref()
            .and_then(|cwd| path.strip_prefix(cwd).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    };

    let message = if config.message.is_empty() {
        "<not set>"
    } else {
        config.message.as_str()
    };
    let content = config
        .content_path
        .as_deref()
        .map(relative)
        .unwrap_or_else(|| "<not set>".to_string());

    info!("Message: {}", message);
    info!("Content file: {}", content);
    info!("Shared paths ({}):", config.shared_paths.len());
    for (i, path) in config.shared_paths.iter().enumerate() {
        info!("  {}. {}", i + 1, relative(path));
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
