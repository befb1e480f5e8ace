// ABOUTME: Entry point for the stolos CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use stolos::config::{self, Config};
use stolos::deploy::DeployError;
use stolos::error::{Error, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        handle_error(e);
    }
}

/// Handle errors with programmatic error types and helpful hints.
fn handle_error(e: Error) -> ! {
    match &e {
        Error::Deploy(deploy_err) => match deploy_err {
            DeployError::Login(_) => {
                eprintln!("Error: {e}");
                eprintln!("       Tip: Check CF_USERNAME and CF_PASSWORD");
                std::process::exit(2);
            }
            DeployError::Push(_) => {
                eprintln!("Error: {e}");
                eprintln!("       All foundations were restored to the previous release");
                std::process::exit(3);
            }
            DeployError::Rollback { .. } => {
                eprintln!("Error: {e}");
                eprintln!("       Some foundations could not be restored - inspect them manually");
                std::process::exit(4);
            }
            DeployError::FinishPush(_) => {
                eprintln!("Error: {e}");
                eprintln!("       The new release is live; venerable cleanup failed");
                std::process::exit(5);
            }
            DeployError::Factory(_) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        Error::ConfigNotFound(path) => {
            eprintln!("Error: Configuration file not found in {}", path.display());
            eprintln!("       Tip: Run 'stolos init' to create stolos.yml");
            std::process::exit(6);
        }
        Error::MissingEnvVar(name) => {
            eprintln!("Error: Missing required environment variable: {name}");
            eprintln!("       Tip: Export CF_USERNAME and CF_PASSWORD before deploying");
            std::process::exit(7);
        }
        _ => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)
        }
        Commands::Deploy {
            environment,
            artifact,
            org,
            space,
            app,
            manifest,
        } => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;

            commands::deploy(
                config,
                commands::DeployArgs {
                    environment,
                    artifact,
                    org,
                    space,
                    app,
                    manifest,
                },
            )
            .await
        }
    }
}
