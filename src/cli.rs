// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stolos")]
#[command(about = "Blue/green artifact deployment across Cloud Foundry foundations")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stolos.yml configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Deploy a zipped artifact to every foundation of an environment
    Deploy {
        /// Environment name from stolos.yml
        #[arg(short, long)]
        environment: String,

        /// Path to the zipped artifact
        #[arg(short, long)]
        artifact: PathBuf,

        /// Cloud Foundry organization
        #[arg(long)]
        org: String,

        /// Cloud Foundry space
        #[arg(long)]
        space: String,

        /// Application name
        #[arg(long)]
        app: String,

        /// Manifest file overriding the one inside the artifact
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}
