// crates/wayfarer-server/src/main.rs
// Wayfarer - MCP tool adapters for a travel site's agents

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".wayfarer/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        match &cli.command {
            Commands::Serve { .. } => Level::WARN, // Quiet for MCP stdio
            Commands::List { .. } | Commands::Tool { .. } => Level::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let result = match cli.command {
        Commands::Serve { adapter } => cli::run_mcp_server(adapter).await,
        Commands::List { adapter } => cli::run_list(adapter),
        Commands::Tool { adapter, name, args } => cli::run_tool(adapter, name, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    // The stdio reader may still be parked on a blocking read; don't wait for it
    std::process::exit(0);
}
