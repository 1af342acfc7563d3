use crate::module::{ModuleDefinition, ModuleId};
use crate::plugin::{PluginArtifact, PluginSource};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Caller-owned collection of plugin sources.
///
/// Sources are registered before orchestration begins; during a run the
/// registry is only read. The interior lock makes registration safe, it is
/// not a license to mutate the set while modules are starting.
#[derive(Default)]
pub struct PluginRegistry {
    sources: RwLock<Vec<Arc<dyn PluginSource>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source<S: PluginSource + 'static>(&self, source: S) {
        self.add(Arc::new(source));
    }

    pub fn add(&self, source: Arc<dyn PluginSource>) {
        self.sources
            .write()
            .expect("plugin source list lock poisoned")
            .push(source);
    }

    pub fn source_count(&self) -> usize {
        self.sources
            .read()
            .expect("plugin source list lock poisoned")
            .len()
    }

    /// Union of every source's contributed modules, each expanded through
    /// its own declared-dependency closure, deduplicated by identity.
    /// Insertion order across sources is preserved.
    pub fn all_modules(&self) -> Vec<ModuleDefinition> {
        let sources = self
            .sources
            .read()
            .expect("plugin source list lock poisoned");

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for source in sources.iter() {
            for definition in modules_with_dependencies(source.as_ref()) {
                if seen.insert(definition.id()) {
                    out.push(definition);
                }
            }
        }
        out
    }

    /// Union of the code units all sources expose, deduplicated by name.
    pub fn all_artifacts(&self) -> Vec<PluginArtifact> {
        let sources = self
            .sources
            .read()
            .expect("plugin source list lock poisoned");

        let mut out: Vec<PluginArtifact> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for source in sources.iter() {
            for artifact in source.artifacts() {
                if seen.insert(artifact.name.clone()) {
                    out.push(artifact);
                }
            }
        }
        out
    }
}

/// A source's modules plus, recursively, the dependencies the source itself
/// provides definitions for. Dependencies owned elsewhere are left to graph
/// resolution.
fn modules_with_dependencies(source: &dyn PluginSource) -> Vec<ModuleDefinition> {
    let definitions = source.modules();
    let by_id: HashMap<ModuleId, &ModuleDefinition> =
        definitions.iter().map(|d| (d.id(), d)).collect();

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for definition in &definitions {
        visit(definition.id(), &by_id, &mut seen, &mut out);
    }
    out
}

fn visit(
    id: ModuleId,
    by_id: &HashMap<ModuleId, &ModuleDefinition>,
    seen: &mut HashSet<ModuleId>,
    out: &mut Vec<ModuleDefinition>,
) {
    if !seen.insert(id) {
        return;
    }
    let Some(definition) = by_id.get(&id) else {
        return;
    };
    out.push((*definition).clone());
    for dep in definition.dependencies() {
        visit(*dep, by_id, seen, out);
    }
}
