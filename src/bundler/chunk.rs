//! Chunk generation for code splitting

use serde::Serialize;

use super::ModuleId;

/// Type of chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    /// Entry point chunk - loaded immediately
    Entry,
    /// Async chunk - loaded on demand via dynamic import
    Async,
    /// Split chunk - a named bundle carved out by a cache group
    Split,
}

/// A chunk is a group of modules that will be bundled together
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk name (used for output filename)
    pub name: String,

    /// Type of chunk
    pub chunk_type: ChunkType,

    /// Module IDs included in this chunk
    pub module_ids: Vec<ModuleId>,

    /// Whether the chunk is needed on initial page load
    pub initial: bool,
}

impl Chunk {
    /// Create a new empty chunk
    pub fn new(name: String, chunk_type: ChunkType) -> Self {
        Self {
            name,
            chunk_type,
            module_ids: Vec::new(),
            initial: chunk_type == ChunkType::Entry,
        }
    }

    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.module_ids.is_empty()
    }
}

/// Expand a `[name]` file pattern for a chunk
pub fn chunk_file(pattern: &str, name: &str) -> String {
    pattern.replace("[name]", name)
}

/// Turn an import request into a chunk-name fragment (`./_home.vue` -> `_home-vue`)
pub fn request_fragment(request: &str) -> String {
    request
        .trim_start_matches("./")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect()
}
