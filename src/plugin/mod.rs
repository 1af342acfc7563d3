//! Plugin sources
//!
//! A plugin source contributes module definitions (and the code units
//! backing them) that the host does not know statically. How a source finds
//! its modules (shared libraries, a manifest file, a directory scan) is the
//! host's concern; graph resolution only consumes the enumeration.

mod registry;

pub use registry::PluginRegistry;

use crate::module::ModuleDefinition;
use serde::Serialize;
use std::path::PathBuf;

/// A contributor of modules not statically known to the host.
pub trait PluginSource: Send + Sync {
    /// Module definitions this source contributes.
    fn modules(&self) -> Vec<ModuleDefinition>;

    /// Code units backing the contributed modules, for the host's loader.
    fn artifacts(&self) -> Vec<PluginArtifact> {
        Vec::new()
    }
}

/// Opaque descriptor of one loadable code unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PluginArtifact {
    pub name: String,
    pub location: Option<PathBuf>,
}

impl PluginArtifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
        }
    }

    pub fn at(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: Some(location.into()),
        }
    }
}

/// A source backed by an in-memory list, for hosts that assemble their
/// plugin set up front (and for tests).
#[derive(Default)]
pub struct StaticPluginSource {
    modules: Vec<ModuleDefinition>,
    artifacts: Vec<PluginArtifact>,
}

impl StaticPluginSource {
    pub fn new(modules: Vec<ModuleDefinition>) -> Self {
        Self {
            modules,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<PluginArtifact>) -> Self {
        self.artifacts = artifacts;
        self
    }
}

impl PluginSource for StaticPluginSource {
    fn modules(&self) -> Vec<ModuleDefinition> {
        self.modules.clone()
    }

    fn artifacts(&self) -> Vec<PluginArtifact> {
        self.artifacts.clone()
    }
}
