mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod page_range;
mod pdf;
mod persist;
mod safety;
mod split;
mod storage;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // stdout carries command output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.load_config()?;

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(config).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&config, &path)?;
        }
        Commands::Split {
            path,
            pages,
            name,
            overwrite,
            no_clobber,
        } => {
            let args = commands::split::SplitArgs {
                path,
                pages,
                name,
                overwrite,
                no_clobber,
            };
            commands::split::run(&config, args)?;
        }
        Commands::Conflict { path } => {
            commands::conflict::run(&config, &path)?;
        }
    }

    Ok(())
}
