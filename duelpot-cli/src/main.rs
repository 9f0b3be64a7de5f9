mod commands;

use clap::{Parser, Subcommand};
use duelpot_core::DuelpotError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "duelpot")]
#[command(about = "Two-party escrow lottery over a local ledger")]
#[command(version)]
struct Cli {
    /// Data directory for ledger and game storage
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management commands
    #[command(subcommand)]
    Account(commands::AccountCommands),

    /// Game commands
    #[command(subcommand)]
    Game(commands::GameCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "duelpot={},duelpot_core={},duelpot_lottery={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("duelpot")
    });

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    let ctx = commands::Context::new(&data_dir).await?;

    // Execute command
    let result = match cli.command {
        Commands::Account(cmd) => commands::handle_account_command(cmd, &ctx).await,
        Commands::Game(cmd) => commands::handle_game_command(cmd, &ctx).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<DuelpotError>() {
            Some(DuelpotError::AccountNotFound { name }) => {
                eprintln!("Error: Account '{}' not found", name);
                eprintln!("Use 'duelpot account list' to see available accounts");
            }
            Some(DuelpotError::InsufficientFunds { need, available }) => {
                eprintln!("Error: Insufficient funds");
                eprintln!("Need: {} units, Available: {} units", need, available);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
