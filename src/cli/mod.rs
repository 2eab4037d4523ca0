//! Command-line interface for Chunkwise
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `plan`: Plan the chunk layout and write the manifest
//! - `classify`: Print the bundle a single module goes into
//! - `init`: Write a default configuration

mod classify;
mod init;
mod plan;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use classify::ClassifyCommand;
pub use init::InitCommand;
pub use plan::{BuildOptions, PlanCommand};

/// Chunkwise - code-splitting planner for single-page apps
#[derive(Parser, Debug)]
#[command(name = "chunkwise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to chunkwise.toml config file
    #[arg(short, long, global = true, default_value = "chunkwise.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan the chunk layout of the project
    Plan(PlanCommand),

    /// Print the bundle a module is assigned to
    Classify(ClassifyCommand),

    /// Write a default chunkwise.toml
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Plan(cmd) => cmd.execute(&self.config).await,
            Commands::Classify(cmd) => cmd.execute(&self.config),
            Commands::Init(cmd) => cmd.execute().await,
        }
    }
}

/// Print the Chunkwise banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "◆".cyan(),
        "Chunkwise".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
