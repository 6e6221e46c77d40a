use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcp_cognitive_models::{
    cli::{execute_command, load_records, DatasetCommands},
    config::{Config, LogFormat},
    server::{AppState, McpServer},
};

/// Normalize, index and analyze simulated-patient cognitive models.
#[derive(Parser, Debug)]
#[command(name = "mcp-cognitive-models", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server over stdio (default)
    Serve,

    #[command(flatten)]
    Dataset(DatasetCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Dataset(command) => {
            let result = execute_command(command, &config);
            if result.exit_code == 0 {
                println!("{}", result.message);
            } else {
                eprintln!("{}", result.message);
            }
            std::process::exit(result.exit_code);
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "MCP Cognitive Models Server starting..."
    );

    let dataset_path = config.dataset.path.clone();
    let state = Arc::new(AppState::new(config));

    // Preload a dataset when configured
    if let Some(path) = dataset_path {
        let records = match load_records(&path) {
            Ok(r) => r,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load dataset");
                return Err(e.into());
            }
        };

        let strict = state.config.normalizer.strict_mode;
        match state.ingest(&records, strict).await {
            Ok((batch, stats)) => {
                if !batch.errors.is_empty() {
                    warn!(rejected = batch.errors.len(), "Some dataset records were rejected");
                }
                info!(models = stats.model_count, "Dataset preloaded");
            }
            Err(e) => {
                error!(error = %e, "Dataset preload aborted");
                return Err(e.into());
            }
        }
    }

    // Start MCP server
    let server = McpServer::new(state);

    info!("Server ready, waiting for requests on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
