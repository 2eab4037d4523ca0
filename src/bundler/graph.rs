//! Module graph data structures

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::classify::ModuleDescriptor;

/// Unique identifier for a module
pub type ModuleId = usize;

/// Types of modules the planner can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    JavaScript,
    Vue,
    Style,
    Json,
    Asset,
    Unknown,
}

impl ModuleType {
    /// Determine module type from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => ModuleType::JavaScript,
            "vue" => ModuleType::Vue,
            "css" | "scss" | "sass" => ModuleType::Style,
            "json" => ModuleType::Json,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "mov" | "mp4" | "webm" | "woff" | "woff2"
            | "eot" | "ttf" | "otf" => ModuleType::Asset,
            _ => ModuleType::Unknown,
        }
    }

    /// Whether imports are extracted from this module
    pub fn has_imports(&self) -> bool {
        matches!(self, ModuleType::JavaScript | ModuleType::Vue)
    }

    pub fn is_style(&self) -> bool {
        matches!(self, ModuleType::Style)
    }
}

/// How a module was pulled in by its importer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Static,
    Dynamic,
}

/// A module in the dependency graph
#[derive(Debug, Clone)]
pub struct Module {
    /// Absolute path to the module
    pub path: PathBuf,

    /// Source size in bytes
    pub size: usize,

    /// Content hash of the source
    pub hash: String,

    /// Module type
    pub module_type: ModuleType,

    /// What the classifier sees of this module
    pub descriptor: ModuleDescriptor,
}

impl Module {
    /// Detect module type from path
    pub fn detect_type(path: &Path) -> ModuleType {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(ModuleType::from_extension)
            .unwrap_or(ModuleType::Unknown)
    }
}

/// The module dependency graph
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules indexed by their ID
    modules: HashMap<ModuleId, Module>,

    /// Map from path to module ID
    path_to_id: HashMap<PathBuf, ModuleId>,

    /// Dependency edges in import order
    edges: HashMap<ModuleId, Vec<(ModuleId, EdgeKind)>>,

    /// Next available module ID
    next_id: ModuleId,
}

impl ModuleGraph {
    /// Add a module to the graph
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let path = module.path.clone();

        // Check if already exists
        if let Some(&id) = self.path_to_id.get(&path) {
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;

        self.path_to_id.insert(path, id);
        self.modules.insert(id, module);
        self.edges.insert(id, Vec::new());

        id
    }

    /// Add a dependency edge between modules
    pub fn add_dependency(&mut self, from: ModuleId, to: ModuleId, kind: EdgeKind) {
        if let Some(deps) = self.edges.get_mut(&from) {
            if !deps.contains(&(to, kind)) {
                deps.push((to, kind));
            }
        }
    }

    /// Get module ID from path
    pub fn get_module_id(&self, path: &Path) -> Option<ModuleId> {
        self.path_to_id.get(path).copied()
    }

    /// Get a module by ID
    pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Get all module IDs in discovery order
    pub fn all_module_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.modules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get all modules reachable from a given module (BFS), optionally
    /// following static imports only
    pub fn get_reachable_modules(&self, start: ModuleId, static_only: bool) -> Vec<ModuleId> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(start);
        visited.insert(start);

        while let Some(id) = queue.pop_front() {
            result.push(id);

            if let Some(deps) = self.edges.get(&id) {
                for &(dep_id, kind) in deps {
                    if static_only && kind == EdgeKind::Dynamic {
                        continue;
                    }
                    if visited.insert(dep_id) {
                        queue.push_back(dep_id);
                    }
                }
            }
        }

        result
    }

    /// Total number of modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
