mod assistant_client;
mod cli;
mod config;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use crate::assistant_client::AssistantClient;
use crate::cli::chat::ChatContext;
use crate::config::ClientConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Question to ask without starting an interactive session
    #[arg(short, long)]
    input: Option<String>,

    /// Base URL of the assistant service (overrides ASSISTANT_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat {
        /// Question to ask without starting an interactive session
        #[arg(short, long)]
        input: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let (input, verbose) = match cli.command {
        Some(Commands::Chat { input, verbose }) => (input.or(cli.input), verbose || cli.verbose),
        None => (cli.input, cli.verbose),
    };

    // Logs go to stderr so they never mix with the transcript
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(verbose))
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting room assistant");

    let config = match ClientConfig::from_env(cli.base_url.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("Invalid configuration: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let client = AssistantClient::new(&config)?;
    let interactive = input.is_none();

    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        input,
        interactive,
        config,
        Arc::new(client),
    );
    chat_context.run().await
}

/// Failures are always reported; `--verbose` adds request and response bodies.
fn log_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_by_default_debug_when_verbose() {
        assert_eq!(log_level(false), Level::WARN);
        assert_eq!(log_level(true), Level::DEBUG);
    }
}
