//! Handback CLI: the main entry point.
//!
//! Commands:
//! - `invoke`     Run an agent on a message and print its answer
//! - `agents`     List configured agents
//! - `schema`     Show the action groups an agent would send
//! - `functions`  List built-in local functions

use std::path::PathBuf;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "handback",
    about = "Handback: inline agents that hand control back to local functions",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.handback/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent on a message
    Invoke {
        /// Name of the configured agent
        #[arg(short, long)]
        agent: String,

        /// Reuse a session id (generated when omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Abandon the invocation after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// The input text
        message: String,
    },

    /// List configured agents
    Agents,

    /// Print the action groups an agent sends, as JSON
    Schema {
        /// Name of the configured agent
        #[arg(short, long)]
        agent: String,
    },

    /// List built-in local functions
    Functions,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Invoke {
            agent,
            session,
            timeout,
            message,
        } => commands::invoke::run(config_path, &agent, session, timeout, &message).await?,
        Commands::Agents => commands::agents::run(config_path)?,
        Commands::Schema { agent } => commands::schema::run(config_path, &agent)?,
        Commands::Functions => commands::functions::run(),
    }

    Ok(())
}
