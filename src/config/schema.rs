//! Configuration schema definitions

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Project metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    #[serde(default = "default_name")]
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
        }
    }
}

fn default_name() -> String {
    "my-app".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Build mode, selected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Production,
    Development,
}

impl BuildMode {
    /// Mode implied by a `NODE_ENV` value. Only `production` selects
    /// production; anything else, or nothing, is development.
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => BuildMode::Production,
            _ => BuildMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

/// Module resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Extensions tried, in order, for extension-less specifiers
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Specifier prefixes mapped to directories relative to the project root
    #[serde(default = "default_aliases")]
    pub alias: BTreeMap<String, String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            alias: default_aliases(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["js".to_string(), "vue".to_string()]
}

fn default_aliases() -> BTreeMap<String, String> {
    [
        ("_src", "src"),
        ("_components", "src/js/components"),
        ("_helpers", "src/js/helpers"),
        ("_assets", "src/assets"),
        ("_scss", "src/scss"),
    ]
    .into_iter()
    .map(|(alias, dir)| (alias.to_string(), dir.to_string()))
    .collect()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// File pattern for initial script chunks
    #[serde(default = "default_filename")]
    pub filename: String,

    /// File pattern for lazily loaded script chunks
    #[serde(default = "default_chunk_filename")]
    pub chunk_filename: String,

    /// File pattern for extracted stylesheets
    #[serde(default = "default_css_filename")]
    pub css_filename: String,

    /// Record a content hash for every chunk
    #[serde(default = "default_true")]
    pub hash: bool,

    /// Write manifest.json into the output directory
    #[serde(default = "default_true")]
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            filename: default_filename(),
            chunk_filename: default_chunk_filename(),
            css_filename: default_css_filename(),
            hash: true,
            manifest: true,
        }
    }
}

fn default_output_dir() -> String {
    "public_html".to_string()
}

fn default_filename() -> String {
    "js/[name].js".to_string()
}

fn default_chunk_filename() -> String {
    "js/lazy/[name].js".to_string()
}

fn default_css_filename() -> String {
    "css/[name].css".to_string()
}

fn default_true() -> bool {
    true
}

/// Code splitting policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Directory name marking third-party packages
    #[serde(default = "default_dependency_store")]
    pub dependency_store: String,

    /// Directory holding local UI components
    #[serde(default = "default_components_dir")]
    pub components_dir: String,

    /// Directory holding local views
    #[serde(default = "default_views_dir")]
    pub views_dir: String,

    /// Substring identifying the UI framework's packages
    #[serde(default = "default_framework_family")]
    pub framework_family: String,

    /// Shared bundle all framework packages collapse into
    #[serde(default = "default_framework_bundle")]
    pub framework_bundle: String,

    /// Fallback bundle, also the merged stylesheet bundle
    #[serde(default = "default_bundle")]
    pub default_bundle: String,

    /// Cache groups deciding which modules get a named bundle
    #[serde(default = "default_cache_groups")]
    pub cache_groups: Vec<CacheGroupConfig>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            dependency_store: default_dependency_store(),
            components_dir: default_components_dir(),
            views_dir: default_views_dir(),
            framework_family: default_framework_family(),
            framework_bundle: default_framework_bundle(),
            default_bundle: default_bundle(),
            cache_groups: default_cache_groups(),
        }
    }
}

fn default_dependency_store() -> String {
    "node_modules".to_string()
}

fn default_components_dir() -> String {
    "src/js/components".to_string()
}

fn default_views_dir() -> String {
    "src/js/views".to_string()
}

fn default_framework_family() -> String {
    "vue".to_string()
}

fn default_framework_bundle() -> String {
    "vueCommons".to_string()
}

fn default_bundle() -> String {
    "bundle".to_string()
}

fn default_cache_groups() -> Vec<CacheGroupConfig> {
    vec![
        CacheGroupConfig {
            key: "styles".to_string(),
            test: r"\.s?css$".to_string(),
            exclude: None,
            min_size: 20_000,
            priority: 20,
        },
        CacheGroupConfig {
            key: "vue".to_string(),
            test: r"\.vue$".to_string(),
            exclude: None,
            min_size: 0,
            priority: 10,
        },
        CacheGroupConfig {
            key: "vendor".to_string(),
            test: r"(node_modules|vendors).+".to_string(),
            exclude: Some(r"css$".to_string()),
            min_size: 10_000,
            priority: 0,
        },
    ]
}

/// A single cache group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheGroupConfig {
    /// Group identifier
    pub key: String,

    /// Regex matched against the module path (`/` separated)
    pub test: String,

    /// Regex that vetoes a match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Minimum aggregate size in bytes before the group becomes its own chunk
    #[serde(default)]
    pub min_size: usize,

    /// Higher priorities are tried first
    #[serde(default)]
    pub priority: i32,
}
