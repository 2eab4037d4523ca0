//! Module resolution
//!
//! Handles extracting imports from module sources and resolving import
//! specifiers to actual file paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::Glob;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::Config;

/// Regex patterns for extracting imports
static IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import|export)\s+(?:(?:(?:\w+\s*,\s*)?(?:\{[^}]*\}|\*(?:\s+as\s+\w+)?)|\w+)\s+from\s+)?["']([^"']+)["']|require\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap()
});

static DYNAMIC_IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s*\(\s*(?:/\*(?P<comment>.*?)\*/\s*)?["'](?P<spec>[^"']+)["']\s*\)"#).unwrap()
});

static CONTEXT_IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s*\(\s*(?:/\*(?P<comment>.*?)\*/\s*)?`(?P<prefix>[^`$]*)\$\{[^}]*\}(?P<suffix>[^`]*)`\s*\)"#).unwrap()
});

static CHUNK_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"webpackChunkName:\s*["']([^"']+)["']"#).unwrap()
});

/// An import found in a module's source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `import x from "spec"`, `require("spec")`
    Static { specifier: String },

    /// `import("spec")`
    Dynamic {
        specifier: String,
        chunk_name: Option<String>,
    },

    /// ``import(`prefix${expr}suffix`)``, matching every file under `prefix`
    /// ending with `suffix`
    Context {
        prefix: String,
        suffix: String,
        chunk_name: Option<String>,
    },
}

/// A file matched by a context import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMatch {
    pub path: PathBuf,

    /// Specifier the file would have been imported with
    pub specifier: String,

    /// Part of the specifier matched by the template expression plus suffix
    pub request: String,
}

/// Module resolver
pub struct Resolver {
    /// Project configuration
    config: Arc<Config>,
}

impl Resolver {
    /// Create a new resolver
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Resolve an import specifier to an absolute file path
    pub fn resolve(&self, specifier: &str, from: &Path) -> Result<Option<PathBuf>> {
        debug!("Resolving '{}' from '{}'", specifier, from.display());

        let base_dir = from.parent().unwrap_or(Path::new("."));

        let resolved = if let Some(target) = self.resolve_alias(specifier) {
            self.resolve_file(&target)?
        } else if specifier.starts_with('.') || specifier.starts_with('/') {
            self.resolve_file(&base_dir.join(specifier))?
        } else {
            self.resolve_bare(specifier, base_dir)?
        };

        debug!("Resolved to: {:?}", resolved);

        Ok(resolved)
    }

    /// Resolve an entrypoint specifier relative to the project root
    pub fn resolve_entry(&self, specifier: &str) -> Result<PathBuf> {
        let root_file = self.config.root.join("__entry__");
        let resolved = if specifier.starts_with('.') || specifier.starts_with('/') {
            self.resolve(specifier, &root_file)?
        } else {
            match self.resolve_file(&self.config.root.join(specifier))? {
                Some(path) => Some(path),
                None => self.resolve(specifier, &root_file)?,
            }
        };

        resolved.with_context(|| format!("Entrypoint '{}' could not be resolved", specifier))
    }

    /// Expand a context import to the files it can load
    pub fn expand_context(&self, prefix: &str, suffix: &str, from: &Path) -> Result<Vec<ContextMatch>> {
        let (dir_spec, name_prefix) = match prefix.rfind('/') {
            Some(index) => (&prefix[..=index], &prefix[index + 1..]),
            None => ("./", prefix),
        };

        let base_dir = from.parent().unwrap_or(Path::new("."));
        let dir = match self.resolve_alias(dir_spec) {
            Some(dir) => dir,
            None if dir_spec.starts_with('.') || dir_spec.starts_with('/') => base_dir.join(dir_spec),
            None => {
                debug!("Skipping context import outside the project: {}", prefix);
                return Ok(Vec::new());
            }
        };

        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let matcher = Glob::new(&format!("{}*{}", name_prefix, suffix))
            .with_context(|| format!("Invalid context import `{}${{}}{}`", prefix, suffix))?
            .compile_matcher();

        let mut matches = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if !matcher.is_match(&relative) {
                continue;
            }

            matches.push(ContextMatch {
                path: entry.path().to_path_buf(),
                specifier: format!("{}{}", dir_spec, relative),
                request: relative.strip_prefix(name_prefix).unwrap_or(&relative).to_string(),
            });
        }

        Ok(matches)
    }

    /// Map an aliased specifier onto the aliased directory
    fn resolve_alias(&self, specifier: &str) -> Option<PathBuf> {
        let (head, rest) = specifier.split_once('/').unwrap_or((specifier, ""));
        self.config.alias_dir(head).map(|dir| dir.join(rest))
    }

    /// Resolve a file path, trying extensions and index files
    fn resolve_file(&self, target: &Path) -> Result<Option<PathBuf>> {
        // Try exact path first
        if target.is_file() {
            return Ok(Some(target.to_path_buf()));
        }

        // Try adding extensions
        for ext in &self.config.resolve.extensions {
            let with_ext = PathBuf::from(format!("{}.{}", target.display(), ext));
            if with_ext.is_file() {
                return Ok(Some(with_ext));
            }
        }

        // Try as directory with index file
        if target.is_dir() {
            for ext in &self.config.resolve.extensions {
                let index = target.join(format!("index.{}", ext));
                if index.is_file() {
                    return Ok(Some(index));
                }
            }
        }

        // Not found
        Ok(None)
    }

    /// Resolve a bare import (from the dependency store)
    fn resolve_bare(&self, specifier: &str, from: &Path) -> Result<Option<PathBuf>> {
        let store = &self.config.split.dependency_store;
        let mut current = from.to_path_buf();

        // Walk up directory tree looking for the store
        loop {
            let node_modules = current.join(store);

            if node_modules.is_dir() {
                if let Some(resolved) = self.resolve_in_node_modules(&node_modules, specifier)? {
                    return Ok(Some(resolved));
                }
            }

            // Move to parent directory
            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve a module within a node_modules directory
    fn resolve_in_node_modules(&self, node_modules: &Path, specifier: &str) -> Result<Option<PathBuf>> {
        // Split specifier into package name and subpath
        let (package_name, subpath) = if specifier.starts_with('@') {
            // Scoped package: @scope/name or @scope/name/subpath
            let parts: Vec<&str> = specifier.splitn(3, '/').collect();
            if parts.len() < 2 {
                return Ok(None);
            }
            let name = format!("{}/{}", parts[0], parts[1]);
            (name, parts.get(2).map(|s| s.to_string()))
        } else {
            // Regular package: name or name/subpath
            let parts: Vec<&str> = specifier.splitn(2, '/').collect();
            (parts[0].to_string(), parts.get(1).map(|s| s.to_string()))
        };

        let package_dir = node_modules.join(&package_name);

        if !package_dir.is_dir() {
            return Ok(None);
        }

        // If there's a subpath, resolve it directly
        if let Some(sub) = subpath {
            return self.resolve_file(&package_dir.join(sub));
        }

        // Otherwise, look at package.json for main/module entry
        let package_json = package_dir.join("package.json");

        if package_json.is_file() {
            let content = fs::read_to_string(&package_json)
                .with_context(|| format!("Failed to read {}", package_json.display()))?;
            let pkg: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", package_json.display()))?;

            // Try module field first (ESM)
            if let Some(module) = pkg.get("module").and_then(|v| v.as_str()) {
                let module_path = package_dir.join(module);
                if module_path.is_file() {
                    return Ok(Some(module_path));
                }
            }

            // Then try main field
            if let Some(main) = pkg.get("main").and_then(|v| v.as_str()) {
                if let Some(resolved) = self.resolve_file(&package_dir.join(main))? {
                    return Ok(Some(resolved));
                }
            }
        }

        // Default to index.js
        self.resolve_file(&package_dir.join("index.js"))
    }
}

/// Extract import/require dependencies from script source code
pub fn extract_imports(source: &str) -> Vec<Import> {
    let mut dependencies = Vec::new();
    let mut push = |import: Import| {
        if !dependencies.contains(&import) {
            dependencies.push(import);
        }
    };

    // Find static imports/exports
    for cap in IMPORT_REGEX.captures_iter(source) {
        if let Some(specifier) = cap.get(1).or_else(|| cap.get(2)) {
            push(Import::Static {
                specifier: specifier.as_str().to_string(),
            });
        }
    }

    // Find dynamic imports
    for cap in DYNAMIC_IMPORT_REGEX.captures_iter(source) {
        push(Import::Dynamic {
            specifier: cap["spec"].to_string(),
            chunk_name: chunk_name(cap.name("comment").map(|m| m.as_str())),
        });
    }

    for cap in CONTEXT_IMPORT_REGEX.captures_iter(source) {
        push(Import::Context {
            prefix: cap["prefix"].to_string(),
            suffix: cap["suffix"].to_string(),
            chunk_name: chunk_name(cap.name("comment").map(|m| m.as_str())),
        });
    }

    debug!("Found {} dependencies", dependencies.len());

    dependencies
}

/// Chunk name from a `webpackChunkName` magic comment
fn chunk_name(comment: Option<&str>) -> Option<String> {
    comment
        .and_then(|c| CHUNK_NAME_REGEX.captures(c))
        .map(|cap| cap[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver_at(root: &Path) -> Resolver {
        let mut config = Config::default_config();
        config.root = root.to_path_buf();
        Resolver::new(Arc::new(config))
    }

    fn write(root: &Path, path: &str, content: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn specifiers(imports: &[Import]) -> Vec<&str> {
        imports
            .iter()
            .filter_map(|i| match i {
                Import::Static { specifier } => Some(specifier.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_extract_imports() {
        let source = r#"
            import foo from './foo';
            import { bar } from './bar.js';
            import * as baz from '../baz';
            export { qux } from './qux';
            const x = require('./x');
            import './side-effect.css';
            import Vue, { nextTick } from 'vue';
            import App, * as AppParts from './App.vue';
            export * from './reexported';
        "#;

        let deps = extract_imports(source);

        assert_eq!(
            specifiers(&deps),
            vec![
                "./foo",
                "./bar.js",
                "../baz",
                "./qux",
                "./x",
                "./side-effect.css",
                "vue",
                "./App.vue",
                "./reexported",
            ]
        );
    }

    #[test]
    fn test_extract_dynamic_imports() {
        let source = r#"
            const module = import('./dynamic');
            const other = import(/* webpackChunkName: "other" */ "./other");
        "#;

        let deps = extract_imports(source);

        assert!(deps.contains(&Import::Dynamic {
            specifier: "./dynamic".to_string(),
            chunk_name: None,
        }));
        assert!(deps.contains(&Import::Dynamic {
            specifier: "./other".to_string(),
            chunk_name: Some("other".to_string()),
        }));
    }

    #[test]
    fn test_extract_context_import() {
        let source = r#"
            function loadView(view) {
                return () =>
                    import(
                        /* webpackChunkName: "view-[request]" */ `_src/js/views/${view}.vue`
                    );
            }
        "#;

        let deps = extract_imports(source);

        assert_eq!(
            deps,
            vec![Import::Context {
                prefix: "_src/js/views/".to_string(),
                suffix: ".vue".to_string(),
                chunk_name: Some("view-[request]".to_string()),
            }]
        );
    }

    #[test]
    fn test_resolve_relative_alias_and_bare() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/js/app.js", "");
        write(root, "src/js/App.vue", "");
        write(root, "src/js/components/Nav.vue", "");
        write(root, "src/js/helpers/index.js", "");
        write(root, "node_modules/vue/package.json", r#"{"main": "dist/vue.runtime.common.js"}"#);
        write(root, "node_modules/vue/dist/vue.runtime.common.js", "");
        write(root, "node_modules/@babel/polyfill/lib/index.js", "");
        write(root, "node_modules/@babel/polyfill/package.json", r#"{"main": "lib/index"}"#);

        let resolver = resolver_at(root);
        let app = root.join("src/js/app.js");

        assert_eq!(resolver.resolve("./App.vue", &app).unwrap(), Some(root.join("src/js/App.vue")));
        assert_eq!(resolver.resolve("./App", &app).unwrap(), Some(root.join("src/js/App.vue")));
        assert_eq!(
            resolver.resolve("_components/Nav", &app).unwrap(),
            Some(root.join("src/js/components/Nav.vue"))
        );
        assert_eq!(resolver.resolve("_helpers", &app).unwrap(), Some(root.join("src/js/helpers/index.js")));
        assert_eq!(
            resolver.resolve("vue", &app).unwrap(),
            Some(root.join("node_modules/vue/dist/vue.runtime.common.js"))
        );
        assert_eq!(resolver.resolve("./missing", &app).unwrap(), None);
        assert_eq!(resolver.resolve("missing-pkg", &app).unwrap(), None);

        assert_eq!(
            resolver.resolve_entry("@babel/polyfill").unwrap(),
            root.join("node_modules/@babel/polyfill/lib/index.js")
        );
        assert_eq!(resolver.resolve_entry("src/js/app.js").unwrap(), app);
        assert!(resolver.resolve_entry("src/nope.js").is_err());
    }

    #[test]
    fn test_expand_context() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/js/views/index.js", "");
        write(root, "src/js/views/_home.vue", "");
        write(root, "src/js/views/_not_found.vue", "");
        write(root, "src/js/views/_home/Hero.vue", "");

        let resolver = resolver_at(root);
        let matches = resolver
            .expand_context("_src/js/views/", ".vue", &root.join("src/js/views/index.js"))
            .unwrap();

        let requests: Vec<_> = matches.iter().map(|m| m.request.as_str()).collect();
        assert_eq!(requests, vec!["_home/Hero.vue", "_home.vue", "_not_found.vue"]);
        assert_eq!(matches[1].specifier, "_src/js/views/_home.vue");
        assert_eq!(matches[1].path, root.join("src/js/views/_home.vue"));
    }
}
