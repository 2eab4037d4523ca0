//! Plan command implementation

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::{Bundler, ChunkType};
use crate::config::{BuildMode, Config};
use crate::utils::{format_duration, format_size};

/// Plan the chunk layout of the project
#[derive(Args, Debug)]
pub struct PlanCommand {
    /// Output directory for manifest.json
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Build mode; defaults to production when NODE_ENV=production and to
    /// development otherwise. Cache groups only apply in production
    #[arg(long, value_enum)]
    pub mode: Option<BuildMode>,

    /// Environment the mode falls back to
    #[arg(long, env = "NODE_ENV", hide = true)]
    pub node_env: Option<String>,

    /// Print the plan without writing the manifest
    #[arg(long)]
    pub dry_run: bool,
}

impl PlanCommand {
    /// Mode selected by `--mode`, falling back to `NODE_ENV`
    pub fn mode(&self) -> BuildMode {
        self.mode
            .unwrap_or_else(|| BuildMode::from_node_env(self.node_env.as_deref()))
    }

    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let config = Config::load(config_path)?;

        eprintln!("{} Planning chunks...", "→".blue());

        let bundler = Bundler::new(config, self.into())?;
        let result = bundler.build().await?;

        eprintln!(
            "\n{} Planned {} chunk(s) from {} module(s) in {}\n",
            "✓".green().bold(),
            result.chunks.len(),
            result.module_count,
            format_duration(start.elapsed())
        );

        for chunk in &result.chunks {
            let kind = match chunk.kind {
                ChunkType::Entry => "entry".yellow(),
                ChunkType::Async => "async".magenta(),
                ChunkType::Split => "split".blue(),
            };

            eprintln!(
                "  {} {} {} {}",
                "•".dimmed(),
                chunk.files.join(", ").cyan(),
                kind,
                format_size(chunk.size).dimmed()
            );
        }

        if let Some(path) = &result.manifest_path {
            eprintln!("\n  {} Manifest written to {}", "→".dimmed(), path.display().to_string().cyan());
        }

        eprintln!();

        Ok(())
    }
}

/// Build options derived from command arguments
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub outdir: Option<PathBuf>,
    pub mode: BuildMode,
    pub write_manifest: bool,
}

impl From<&PlanCommand> for BuildOptions {
    fn from(cmd: &PlanCommand) -> Self {
        Self {
            outdir: cmd.outdir.clone(),
            mode: cmd.mode(),
            write_manifest: !cmd.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn plan(args: &[&str]) -> PlanCommand {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        match cli.command {
            Commands::Plan(cmd) => cmd,
            other => panic!("expected plan, got {:?}", other),
        }
    }

    #[test]
    fn test_node_env_selects_mode() {
        assert_eq!(BuildMode::from_node_env(None), BuildMode::Development);
        assert_eq!(BuildMode::from_node_env(Some("test")), BuildMode::Development);
        assert_eq!(BuildMode::from_node_env(Some("development")), BuildMode::Development);
        assert_eq!(BuildMode::from_node_env(Some("production")), BuildMode::Production);
    }

    #[test]
    fn test_unknown_node_env_plans_development() {
        let cmd = plan(&["chunkwise", "plan", "--node-env", "test"]);
        assert_eq!(cmd.mode(), BuildMode::Development);

        let cmd = plan(&["chunkwise", "plan", "--node-env", "production"]);
        assert_eq!(BuildOptions::from(&cmd).mode, BuildMode::Production);
    }

    #[test]
    fn test_explicit_mode_wins_over_node_env() {
        let cmd = plan(&["chunkwise", "plan", "--node-env", "production", "--mode", "development"]);
        assert_eq!(cmd.mode(), BuildMode::Development);

        assert!(Cli::try_parse_from(["chunkwise", "plan", "--mode", "test"]).is_err());
    }
}
