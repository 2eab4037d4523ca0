//! Configuration handling for Chunkwise
//!
//! Parses and manages chunkwise.toml configuration files.

mod schema;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project metadata
    #[serde(default)]
    pub project: ProjectConfig,

    /// Entry points, walked in declaration order
    #[serde(default = "default_entrypoints")]
    pub entrypoints: IndexMap<String, String>,

    /// Module resolution
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Code splitting policy
    #[serde(default)]
    pub split: SplitConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_entrypoints() -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    map.insert("polyfill".to_string(), "@babel/polyfill".to_string());
    map.insert("main".to_string(), "src/js/app.js".to_string());
    map
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let canonical_path = absolute(path.as_ref())?;

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        // Set root directory to the directory containing the config file
        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self::parse(&content, root)
    }

    /// Load the configuration file if it exists, otherwise use the defaults
    /// rooted at the current directory
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = absolute(path.as_ref())?;
        if path.is_file() {
            return Self::load(path);
        }

        let mut config = Self::default_config();
        config.root = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Parse configuration text rooted at `root`
    pub fn parse(content: &str, root: PathBuf) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse chunkwise.toml")?;
        config.root = root;

        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            project: ProjectConfig::default(),
            entrypoints: default_entrypoints(),
            resolve: ResolveConfig::default(),
            output: OutputConfig::default(),
            split: SplitConfig::default(),
            root: PathBuf::from("."),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.entrypoints.is_empty() {
            anyhow::bail!("At least one entrypoint must be specified in chunkwise.toml");
        }

        for (field, dir) in [
            ("dependency_store", &self.split.dependency_store),
            ("components_dir", &self.split.components_dir),
            ("views_dir", &self.split.views_dir),
        ] {
            if dir.trim_matches(|c: char| c == '/' || c == '\\').is_empty() {
                anyhow::bail!("split.{} must not be empty", field);
            }
        }

        let mut keys = HashSet::new();
        for group in &self.split.cache_groups {
            if !keys.insert(group.key.as_str()) {
                anyhow::bail!("Cache group '{}' is defined more than once", group.key);
            }
        }

        for (field, pattern) in [
            ("filename", &self.output.filename),
            ("chunk_filename", &self.output.chunk_filename),
            ("css_filename", &self.output.css_filename),
        ] {
            if !pattern.contains("[name]") {
                anyhow::bail!("output.{} must contain [name], got '{}'", field, pattern);
            }
        }

        Ok(())
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Get all entrypoints in walk order
    pub fn all_entrypoints(&self) -> Vec<(String, String)> {
        self.entrypoints
            .iter()
            .map(|(name, spec)| (name.clone(), spec.clone()))
            .collect()
    }

    /// Directory an alias points to, if the alias is configured
    pub fn alias_dir(&self, alias: &str) -> Option<PathBuf> {
        self.resolve.alias.get(alias).map(|dir| self.root.join(dir))
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("", PathBuf::from("/project")).unwrap();

        assert_eq!(config.output.dir, "public_html");
        assert_eq!(config.output.filename, "js/[name].js");
        assert_eq!(config.split.default_bundle, "bundle");
        assert_eq!(config.split.framework_bundle, "vueCommons");
        assert_eq!(
            config.all_entrypoints(),
            vec![
                ("polyfill".to_string(), "@babel/polyfill".to_string()),
                ("main".to_string(), "src/js/app.js".to_string()),
            ]
        );
        let keys: Vec<_> = config.split.cache_groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["styles", "vue", "vendor"]);
        assert_eq!(config.output_dir(), PathBuf::from("/project/public_html"));
        assert_eq!(
            config.alias_dir("_components"),
            Some(PathBuf::from("/project/src/js/components"))
        );
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let config = Config::parse(
            r#"
            [entrypoints]
            app = "src/index.js"

            [split]
            framework_family = "react"
            framework_bundle = "reactCommons"

            [[split.cache_groups]]
            key = "vendor"
            test = "node_modules"
            min_size = 500
            "#,
            PathBuf::from("/project"),
        )
        .unwrap();

        assert_eq!(config.entrypoints.len(), 1);
        assert_eq!(config.split.framework_family, "react");
        assert_eq!(config.split.views_dir, "src/js/views");
        assert_eq!(config.split.cache_groups.len(), 1);
        assert_eq!(config.split.cache_groups[0].priority, 0);
        assert!(config.split.cache_groups[0].exclude.is_none());
    }

    #[test]
    fn test_entrypoints_keep_declaration_order() {
        let content = r#"
            [entrypoints]
            polyfill = "src/js/poly.js"
            main = "src/js/app.js"
            admin = "src/js/admin.js"
        "#;
        let config = Config::parse(content, PathBuf::from("/project")).unwrap();

        let names: Vec<_> = config.all_entrypoints().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["polyfill", "main", "admin"]);
    }

    #[test]
    fn test_rejects_empty_split_dirs() {
        for field in ["dependency_store", "components_dir", "views_dir"] {
            let content = format!("[split]\n{} = \"/\"\n", field);
            let err = Config::parse(&content, PathBuf::from("/project")).unwrap_err();
            assert_eq!(err.to_string(), format!("split.{} must not be empty", field));
        }
    }

    #[test]
    fn test_rejects_empty_entrypoints() {
        let err = Config::parse("[entrypoints]\n", PathBuf::from("/project")).unwrap_err();
        assert!(err.to_string().contains("At least one entrypoint"));
    }

    #[test]
    fn test_rejects_duplicate_cache_groups() {
        let content = r#"
            [[split.cache_groups]]
            key = "vendor"
            test = "a"

            [[split.cache_groups]]
            key = "vendor"
            test = "b"
        "#;
        let err = Config::parse(content, PathBuf::from("/project")).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_filename_without_name_placeholder() {
        let content = "[output]\nfilename = \"js/app.js\"\n";
        let err = Config::parse(content, PathBuf::from("/project")).unwrap_err();
        assert!(err.to_string().contains("output.filename"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("chunkwise.toml")).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.split.dependency_store, "node_modules");
    }

    #[test]
    fn test_load_sets_root_from_file_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunkwise.toml");
        fs::write(&path, "[project]\nname = \"site\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.project.name, "site");
        assert_eq!(config.root, dir.path());
    }
}
