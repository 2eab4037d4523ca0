//! Chunkwise library
//!
//! Core functionality for the Chunkwise code-splitting planner.

pub mod bundler;
pub mod classify;
pub mod cli;
pub mod config;
pub mod resolver;
pub mod utils;

pub use bundler::Bundler;
pub use classify::{BundleName, Classifier, ModuleDescriptor};
pub use cli::Cli;
pub use config::Config;
