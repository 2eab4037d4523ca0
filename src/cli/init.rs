//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Write a default chunkwise.toml
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub dir: String,

    /// Overwrite an existing chunkwise.toml
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.dir);
        let config_path = project_dir.join("chunkwise.toml");

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists, pass --force to overwrite it",
                config_path.display()
            );
        }

        fs::create_dir_all(project_dir).context("Failed to create project directory")?;
        fs::write(&config_path, self.generate_config())
            .context("Failed to write chunkwise.toml")?;

        eprintln!("  {} Created {}", "✓".green(), config_path.display().to_string().cyan());
        eprintln!("\n  Next steps:");
        eprintln!("    {} chunkwise plan --dry-run", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_config(&self) -> String {
        let name = Path::new(&self.dir)
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "my-app".to_string());

        format!(
r#"# Chunkwise configuration

[project]
name = "{name}"
version = "0.1.0"

[entrypoints]
polyfill = "@babel/polyfill"
main = "src/js/app.js"

[resolve]
extensions = ["js", "vue"]

[resolve.alias]
_src = "src"
_components = "src/js/components"
_helpers = "src/js/helpers"
_assets = "src/assets"
_scss = "src/scss"

[output]
dir = "public_html"
filename = "js/[name].js"
chunk_filename = "js/lazy/[name].js"
css_filename = "css/[name].css"

[split]
dependency_store = "node_modules"
components_dir = "src/js/components"
views_dir = "src/js/views"
framework_family = "vue"
framework_bundle = "vueCommons"
default_bundle = "bundle"

# Merge all the CSS into one file
[[split.cache_groups]]
key = "styles"
test = '\.s?css$'
min_size = 20000
priority = 20

[[split.cache_groups]]
key = "vue"
test = '\.vue$'
min_size = 0
priority = 10

[[split.cache_groups]]
key = "vendor"
test = '(node_modules|vendors).+'
exclude = 'css$'
min_size = 10000
priority = 0
"#,
            name = name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_generated_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = InitCommand {
            dir: dir.path().display().to_string(),
            force: false,
        };
        cmd.execute().await.unwrap();

        let config = Config::load(dir.path().join("chunkwise.toml")).unwrap();
        let defaults = Config::default_config();
        assert_eq!(config.entrypoints, defaults.entrypoints);
        assert_eq!(config.resolve.alias, defaults.resolve.alias);
        assert_eq!(config.split.cache_groups.len(), 3);
        assert_eq!(config.split.cache_groups[2].exclude.as_deref(), Some("css$"));

        assert!(cmd.execute().await.is_err());
    }
}
