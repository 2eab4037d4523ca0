//! Bundle classification
//!
//! Decides, for every module pulled into the dependency graph, which named
//! output bundle it belongs to. Third-party packages get one bundle each
//! (framework packages share one), local components and views get
//! fine-grained bundles, and all styles collapse into the default bundle.
//!
//! Classification happens in two steps: [`Classifier::parse`] turns a
//! [`ModuleDescriptor`] into a [`ModuleOrigin`], and
//! [`Classifier::bundle_name`] maps the origin to a [`BundleName`].

mod error;
mod path;

use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::config::SplitConfig;

pub use error::ClassifyError;
pub use path::{lower_first, normalize_separators, request_base_name};

/// A module as supplied by the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Directory containing the module
    pub context: String,

    /// Import specifier the module was requested with
    pub raw_request: Option<String>,

    /// CSS-origin module
    pub is_style: bool,
}

impl ModuleDescriptor {
    /// Script or component module requested with `raw_request`
    pub fn script(context: impl Into<String>, raw_request: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            raw_request: Some(raw_request.into()),
            is_style: false,
        }
    }

    /// Script module without a locally resolvable request
    pub fn unnamed(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            raw_request: None,
            is_style: false,
        }
    }

    /// Style module
    pub fn style(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            raw_request: None,
            is_style: true,
        }
    }
}

/// Where a module comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    Style,
    ThirdParty { package: String },
    LocalComponent { name: String },
    LocalView { view: String, name: String },
    Other,
}

/// Category of a bundle name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Package,
    Component,
    View,
    Default,
}

/// Name of the output bundle a module is grouped into
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BundleName {
    kind: BundleKind,
    name: String,
}

impl BundleName {
    pub fn package(package: &str) -> Self {
        Self {
            kind: BundleKind::Package,
            name: format!("pkg.{}", package),
        }
    }

    pub fn component(name: &str) -> Self {
        Self {
            kind: BundleKind::Component,
            name: format!("component.{}", name),
        }
    }

    pub fn view(view: &str, name: &str) -> Self {
        Self {
            kind: BundleKind::View,
            name: format!("view.{}-{}", view, name),
        }
    }

    pub fn fallback(name: &str) -> Self {
        Self {
            kind: BundleKind::Default,
            name: name.to_string(),
        }
    }

    pub fn kind(&self) -> BundleKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Assigns modules to bundles according to a [`SplitConfig`]
#[derive(Debug, Clone)]
pub struct Classifier {
    store_marker: String,
    store_package: Regex,
    components_dir: String,
    views_dir: String,
    framework_family: String,
    framework_bundle: String,
    default_bundle: String,
}

impl Classifier {
    /// Create a classifier from the split policy
    pub fn new(split: &SplitConfig) -> Result<Self, ClassifyError> {
        Ok(Self {
            store_marker: split.dependency_store.clone(),
            store_package: path::store_package_pattern(&split.dependency_store)?,
            components_dir: path::trim_dir(&split.components_dir),
            views_dir: path::trim_dir(&split.views_dir),
            framework_family: split.framework_family.clone(),
            framework_bundle: split.framework_bundle.clone(),
            default_bundle: split.default_bundle.clone(),
        })
    }

    /// Classify a module into its bundle
    pub fn classify(&self, module: &ModuleDescriptor) -> Result<BundleName, ClassifyError> {
        let origin = self.parse(module)?;
        let bundle = self.bundle_name(&origin);
        debug!("{} -> {}", module.context, bundle);
        Ok(bundle)
    }

    /// Work out where a module comes from
    pub fn parse(&self, module: &ModuleDescriptor) -> Result<ModuleOrigin, ClassifyError> {
        if module.is_style {
            return Ok(ModuleOrigin::Style);
        }

        if module.context.contains(&self.store_marker) {
            let package = self.package_name(&module.context)?;
            return Ok(ModuleOrigin::ThirdParty { package });
        }

        let Some(name) = module.raw_request.as_deref().and_then(request_base_name) else {
            return Ok(ModuleOrigin::Other);
        };

        let context = normalize_separators(&module.context);

        if within_dir(&context, &self.components_dir) {
            return Ok(ModuleOrigin::LocalComponent {
                name: lower_first(name),
            });
        }

        if let Some(view) = self.view_folder(&context, name) {
            return Ok(ModuleOrigin::LocalView {
                view,
                name: name.to_string(),
            });
        }

        Ok(ModuleOrigin::Other)
    }

    /// Bundle a module of the given origin goes into
    pub fn bundle_name(&self, origin: &ModuleOrigin) -> BundleName {
        match origin {
            ModuleOrigin::Style | ModuleOrigin::Other => BundleName::fallback(&self.default_bundle),
            ModuleOrigin::ThirdParty { package } if package.contains(&self.framework_family) => {
                BundleName::package(&self.framework_bundle)
            }
            ModuleOrigin::ThirdParty { package } => BundleName::package(package),
            ModuleOrigin::LocalComponent { name } => BundleName::component(name),
            ModuleOrigin::LocalView { view, name } => BundleName::view(view, name),
        }
    }

    /// The default bundle name
    pub fn default_bundle(&self) -> BundleName {
        BundleName::fallback(&self.default_bundle)
    }

    /// Package directory right after the store marker, first `@` removed
    fn package_name(&self, context: &str) -> Result<String, ClassifyError> {
        let segment = self
            .store_package
            .captures(context)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| ClassifyError::MalformedStorePath {
                context: context.to_string(),
                marker: self.store_marker.clone(),
            })?;

        Ok(segment.replacen('@', "", 1))
    }

    /// Folder of the view a module belongs to. A module directly inside the
    /// views directory is its own view.
    fn view_folder(&self, context: &str, name: &str) -> Option<String> {
        let context = format!("/{}/", context);
        let marker = format!("/{}/", self.views_dir);
        let index = context.find(&marker)?;

        let folder = context[index + marker.len()..]
            .split('/')
            .next()
            .filter(|folder| !folder.is_empty())
            .unwrap_or(name);
        Some(folder.to_string())
    }
}

/// Whether `context` is `dir` or lies below it, matching whole path segments
fn within_dir(context: &str, dir: &str) -> bool {
    format!("/{}/", context).contains(&format!("/{}/", dir))
}
