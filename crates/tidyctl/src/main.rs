//! Tidy Control - run Windows maintenance tools from the command line.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tidy_common::{Config, ToolTable, VERSION};
use tidy_engine::{Dispatcher, OutputRelay};
use tidyctl::commands;
use tidyctl::errors::EXIT_FAILURE;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tidyctl")]
#[command(about = "Tidy - Windows maintenance tool runner", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available tools and their aliases
    List,

    /// Run a maintenance tool
    Run {
        /// Tool identifier, short or long alias (e.g. sfc, sfc-scan)
        tool: String,

        /// Print the outcome as JSON instead of streaming output
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,

    /// Resolve the subscription plan for an e-mail
    Plan {
        email: String,

        /// JSON file of e-mail -> subscription records
        #[arg(long)]
        billing_file: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };
    init_logging(&config);

    let code = match execute(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    };
    io::stdout().flush().ok();
    std::process::exit(code);
}

async fn execute(command: Commands, config: Config) -> Result<i32> {
    let table = ToolTable::builtin(&config);

    match command {
        Commands::List => commands::list(&table),
        Commands::Run { tool, json } => {
            let dispatcher = Dispatcher::new(table, Arc::new(OutputRelay::new()));
            commands::run(&dispatcher, &tool, json).await
        }
        Commands::Config => commands::config(&config),
        Commands::Plan {
            email,
            billing_file,
            json,
        } => commands::plan(&config, &email, billing_file.as_deref(), json),
    }
}

/// Logs go to stderr so stdout carries tool output only
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
