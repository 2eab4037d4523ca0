//! Chunk planner
//!
//! Walks the module graph, assigns every module to a chunk and produces the
//! output layout of a build.

mod chunk;
mod graph;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{normalize_separators, Classifier, ModuleDescriptor};
use crate::cli::BuildOptions;
use crate::config::{CacheGroupConfig, Config};
use crate::resolver::{extract_imports, Import, Resolver};
use crate::utils::{hash_content, path_to_module_id, relative_path};

pub use chunk::{chunk_file, request_fragment, Chunk, ChunkType};
pub use graph::{EdgeKind, Module, ModuleGraph, ModuleId, ModuleType};

/// Result of a build operation
#[derive(Debug)]
pub struct BuildResult {
    /// Planned chunks, ordered by name
    pub chunks: Vec<PlannedChunk>,

    /// Number of modules in the graph
    pub module_count: usize,

    /// Where the manifest was written, if it was
    pub manifest_path: Option<PathBuf>,
}

/// A chunk as it lands in the output directory
#[derive(Debug, Clone, Serialize)]
pub struct PlannedChunk {
    #[serde(skip)]
    pub name: String,

    pub kind: ChunkType,

    /// Output files, relative to the output directory
    pub files: Vec<String>,

    /// Module paths, relative to the project root
    pub modules: Vec<String>,

    /// Total source size in bytes
    pub size: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// A compiled cache group
#[derive(Debug)]
struct CacheGroup {
    key: String,
    test: Regex,
    exclude: Option<Regex>,
    min_size: usize,
}

impl CacheGroup {
    fn compile(config: &CacheGroupConfig) -> Result<Self> {
        let test = Regex::new(&config.test)
            .with_context(|| format!("Invalid test pattern for cache group '{}'", config.key))?;
        let exclude = config
            .exclude
            .as_deref()
            .map(Regex::new)
            .transpose()
            .with_context(|| format!("Invalid exclude pattern for cache group '{}'", config.key))?;

        Ok(Self {
            key: config.key.clone(),
            test,
            exclude,
            min_size: config.min_size,
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.as_ref().is_some_and(|e| e.is_match(path))
    }
}

/// A module loaded through a dynamic import, starting its own async chunk
#[derive(Debug)]
struct AsyncRoot {
    module_id: ModuleId,
    chunk_name: String,
}

/// State collected while walking the module graph
#[derive(Debug, Default)]
struct Walk {
    graph: ModuleGraph,
    entries: Vec<(String, ModuleId)>,
    async_roots: Vec<AsyncRoot>,
}

/// The chunk planner
pub struct Bundler {
    /// Project configuration
    config: Arc<Config>,

    /// Canonical project root
    root: PathBuf,

    /// Build options
    options: BuildOptions,

    /// Module resolver
    resolver: Resolver,

    /// Bundle classifier
    classifier: Classifier,

    /// Cache groups, highest priority first
    cache_groups: Vec<CacheGroup>,
}

impl Bundler {
    /// Create a new bundler instance
    pub fn new(config: Config, options: BuildOptions) -> Result<Self> {
        let config = Arc::new(config);
        let root = fs::canonicalize(&config.root).unwrap_or_else(|_| config.root.clone());
        let resolver = Resolver::new(config.clone());
        let classifier = Classifier::new(&config.split)?;

        let mut groups: Vec<&CacheGroupConfig> = config.split.cache_groups.iter().collect();
        groups.sort_by(|a, b| b.priority.cmp(&a.priority));
        let cache_groups = groups
            .into_iter()
            .map(CacheGroup::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            root,
            options,
            resolver,
            classifier,
            cache_groups,
        })
    }

    /// Plan the build and write the manifest
    pub async fn build(&self) -> Result<BuildResult> {
        let start = Instant::now();

        // 1. Build the module graph from entrypoints
        info!("Building module graph...");
        let walk = self.build_module_graph()?;

        // 2. Assign modules to chunks
        info!("Assigning {} modules to chunks ({:?} mode)...", walk.graph.module_count(), self.options.mode);
        let chunks = self.assign_chunks(&walk)?;

        // 3. Lay out output files
        let planned = self.plan_outputs(&walk.graph, &chunks);

        // 4. Write manifest
        let manifest_path = if self.options.write_manifest && self.config.output.manifest {
            Some(self.write_manifest(&planned).await?)
        } else {
            None
        };

        debug!("Planning completed in {:?}", start.elapsed());

        Ok(BuildResult {
            chunks: planned,
            module_count: walk.graph.module_count(),
            manifest_path,
        })
    }

    /// Build the module graph by traversing from entrypoints
    fn build_module_graph(&self) -> Result<Walk> {
        let mut walk = Walk::default();

        for (name, specifier) in self.config.all_entrypoints() {
            let path = self.resolver.resolve_entry(&specifier)?;
            debug!("Processing entrypoint: {} -> {}", name, path.display());
            let id = self.process_module(&mut walk, &path, &specifier)?;
            walk.entries.push((name, id));
        }

        Ok(walk)
    }

    /// Process a single module and its dependencies
    fn process_module(&self, walk: &mut Walk, path: &Path, request: &str) -> Result<ModuleId> {
        let canonical_path = fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve module path: {}", path.display()))?;

        // Check if already processed
        if let Some(id) = walk.graph.get_module_id(&canonical_path) {
            return Ok(id);
        }

        let source = fs::read(&canonical_path)
            .with_context(|| format!("Failed to read module: {}", canonical_path.display()))?;

        let module_type = Module::detect_type(&canonical_path);
        let imports = if module_type.has_imports() {
            extract_imports(&String::from_utf8_lossy(&source))
        } else {
            Vec::new()
        };

        let module = Module {
            descriptor: self.describe(&canonical_path, request, module_type),
            path: canonical_path.clone(),
            size: source.len(),
            hash: hash_content(&source),
            module_type,
        };
        let module_id = walk.graph.add_module(module);

        for import in imports {
            match import {
                Import::Static { specifier } => {
                    self.follow(walk, module_id, &canonical_path, &specifier, EdgeKind::Static)?;
                }
                Import::Dynamic { specifier, chunk_name } => {
                    if let Some(dep_id) =
                        self.follow(walk, module_id, &canonical_path, &specifier, EdgeKind::Dynamic)?
                    {
                        let name = async_chunk_name(chunk_name.as_deref(), &specifier, walk, dep_id);
                        add_async_root(walk, dep_id, name);
                    }
                }
                Import::Context { prefix, suffix, chunk_name } => {
                    for found in self.resolver.expand_context(&prefix, &suffix, &canonical_path)? {
                        let dep_id = self.process_module(walk, &found.path, &found.specifier)?;
                        walk.graph.add_dependency(module_id, dep_id, EdgeKind::Dynamic);
                        let name = async_chunk_name(chunk_name.as_deref(), &found.request, walk, dep_id);
                        add_async_root(walk, dep_id, name);
                    }
                }
            }
        }

        Ok(module_id)
    }

    /// Resolve an import and walk into it
    fn follow(
        &self,
        walk: &mut Walk,
        from: ModuleId,
        from_path: &Path,
        specifier: &str,
        kind: EdgeKind,
    ) -> Result<Option<ModuleId>> {
        match self.resolver.resolve(specifier, from_path)? {
            Some(resolved) => {
                let dep_id = self.process_module(walk, &resolved, specifier)?;
                walk.graph.add_dependency(from, dep_id, kind);
                Ok(Some(dep_id))
            }
            None => {
                warn!("Could not resolve '{}' from {}", specifier, from_path.display());
                Ok(None)
            }
        }
    }

    /// Build the descriptor the classifier sees for a module
    fn describe(&self, path: &Path, request: &str, module_type: ModuleType) -> ModuleDescriptor {
        let context = path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "/".to_string());

        if module_type.is_style() {
            ModuleDescriptor::style(context)
        } else if context.contains(&self.config.split.dependency_store) {
            ModuleDescriptor::unnamed(context)
        } else {
            ModuleDescriptor::script(context, request)
        }
    }

    /// Assign every module to exactly one chunk
    fn assign_chunks(&self, walk: &Walk) -> Result<Vec<Chunk>> {
        let graph = &walk.graph;
        let mut owners: HashMap<ModuleId, String> = HashMap::new();
        let mut eager: HashSet<ModuleId> = HashSet::new();
        let mut chunk_types: HashMap<String, ChunkType> = HashMap::new();

        for (name, entry_id) in &walk.entries {
            chunk_types.insert(name.clone(), ChunkType::Entry);
            for id in graph.get_reachable_modules(*entry_id, true) {
                eager.insert(id);
                owners.entry(id).or_insert_with(|| name.clone());
            }
        }

        for root in &walk.async_roots {
            chunk_types.entry(root.chunk_name.clone()).or_insert(ChunkType::Async);
            for id in graph.get_reachable_modules(root.module_id, true) {
                owners.entry(id).or_insert_with(|| root.chunk_name.clone());
            }
        }

        // Cache groups only apply to production builds
        let assigned = if self.options.mode.is_production() {
            self.split_modules(graph)?
        } else {
            HashMap::new()
        };

        let mut chunks: BTreeMap<String, Chunk> = BTreeMap::new();
        for id in graph.all_module_ids() {
            let name = match assigned.get(&id).or_else(|| owners.get(&id)) {
                Some(name) => name.clone(),
                None => self.classifier.default_bundle().to_string(),
            };

            let chunk = chunks.entry(name.clone()).or_insert_with(|| {
                let chunk_type = chunk_types.get(&name).copied().unwrap_or(ChunkType::Split);
                Chunk::new(name.clone(), chunk_type)
            });
            chunk.module_ids.push(id);
            if eager.contains(&id) {
                chunk.initial = true;
            }
        }

        Ok(chunks.into_values().collect())
    }

    /// Name the modules carved out by cache groups. Groups below their
    /// minimum size are left out, so their modules stay with their owners.
    fn split_modules(&self, graph: &ModuleGraph) -> Result<HashMap<ModuleId, String>> {
        let mut candidates: BTreeMap<(usize, String), Vec<ModuleId>> = BTreeMap::new();

        for id in graph.all_module_ids() {
            let Some(module) = graph.get_module(id) else {
                continue;
            };
            let path = normalize_separators(&module.path.display().to_string());
            let Some(index) = self.cache_groups.iter().position(|g| g.matches(&path)) else {
                continue;
            };

            let bundle = self
                .classifier
                .classify(&module.descriptor)
                .with_context(|| format!("Failed to classify {}", module.path.display()))?;
            candidates.entry((index, bundle.to_string())).or_default().push(id);
        }

        let mut assigned = HashMap::new();
        for ((index, name), module_ids) in candidates {
            let group = &self.cache_groups[index];
            let size: usize = module_ids
                .iter()
                .filter_map(|id| graph.get_module(*id))
                .map(|m| m.size)
                .sum();

            if size < group.min_size {
                debug!(
                    "Cache group '{}' keeps '{}' inline ({} < {} bytes)",
                    group.key, name, size, group.min_size
                );
                continue;
            }

            for id in module_ids {
                assigned.insert(id, name.clone());
            }
        }

        Ok(assigned)
    }

    /// Work out output files, sizes and hashes for every chunk
    fn plan_outputs(&self, graph: &ModuleGraph, chunks: &[Chunk]) -> Vec<PlannedChunk> {
        let production = self.options.mode.is_production();
        let output = &self.config.output;

        chunks
            .iter()
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| {
                let modules: Vec<&Module> = chunk
                    .module_ids
                    .iter()
                    .filter_map(|id| graph.get_module(*id))
                    .collect();

                let has_style = modules.iter().any(|m| m.module_type.is_style());
                let has_script = modules.iter().any(|m| !m.module_type.is_style());

                let mut files = Vec::new();
                if has_script || !production {
                    let pattern = if chunk.initial {
                        &output.filename
                    } else {
                        &output.chunk_filename
                    };
                    files.push(chunk_file(pattern, &chunk.name));
                }
                if has_style && production {
                    files.push(chunk_file(&output.css_filename, &chunk.name));
                }

                let hash = output.hash.then(|| {
                    let joined: String = modules.iter().map(|m| m.hash.as_str()).collect();
                    hash_content(joined.as_bytes())
                });

                PlannedChunk {
                    name: chunk.name.clone(),
                    kind: chunk.chunk_type,
                    files,
                    modules: modules
                        .iter()
                        .map(|m| relative_path(&self.root, &m.path).unwrap_or_else(|| path_to_module_id(&m.path)))
                        .collect(),
                    size: modules.iter().map(|m| m.size).sum(),
                    hash,
                }
            })
            .collect()
    }

    /// Write manifest.json into the output directory
    async fn write_manifest(&self, chunks: &[PlannedChunk]) -> Result<PathBuf> {
        let output_dir = self
            .options
            .outdir
            .clone()
            .unwrap_or_else(|| self.config.output_dir());

        tokio::fs::create_dir_all(&output_dir)
            .await
            .context("Failed to create output directory")?;

        let manifest: BTreeMap<&str, &PlannedChunk> =
            chunks.iter().map(|chunk| (chunk.name.as_str(), chunk)).collect();
        let manifest_json = serde_json::to_string_pretty(&manifest)?;

        let manifest_path = output_dir.join("manifest.json");
        tokio::fs::write(&manifest_path, manifest_json)
            .await
            .context("Failed to write manifest.json")?;

        Ok(manifest_path)
    }
}

/// Name of the async chunk started by a dynamic import
fn async_chunk_name(chunk_name: Option<&str>, request: &str, walk: &Walk, module_id: ModuleId) -> String {
    match chunk_name {
        Some(name) => name.replace("[request]", &request_fragment(request)),
        None => walk
            .graph
            .get_module(module_id)
            .and_then(|m| m.path.file_stem())
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| request_fragment(request)),
    }
}

fn add_async_root(walk: &mut Walk, module_id: ModuleId, chunk_name: String) {
    if walk.async_roots.iter().any(|root| root.module_id == module_id) {
        return;
    }
    walk.async_roots.push(AsyncRoot { module_id, chunk_name });
}
