use crate::lifecycle::LifecyclePhase;
use crate::module::{Module, ModuleContext, ModuleDefinition, ModuleId};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One resolved module within an orchestration run.
///
/// Created exactly once per identity during graph construction. The
/// dependency edge list is populated in a second pass, after every node
/// exists, so declaration order never matters for resolution.
pub struct ModuleNode {
    definition: ModuleDefinition,
    instance: RwLock<Box<dyn Module>>,
    dependencies: Vec<usize>,
    is_plugin: bool,
}

impl ModuleNode {
    pub(crate) fn new(definition: ModuleDefinition, instance: Box<dyn Module>, is_plugin: bool) -> Self {
        Self {
            definition,
            instance: RwLock::new(instance),
            dependencies: Vec::new(),
            is_plugin,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.definition.id()
    }

    /// Whether this module arrived through a plugin source rather than the
    /// static dependency closure. Diagnostics only; never affects ordering.
    pub fn is_plugin(&self) -> bool {
        self.is_plugin
    }

    /// The identities the module declared, before resolution.
    pub fn declared_dependencies(&self) -> &[ModuleId] {
        self.definition.dependencies()
    }

    pub(crate) fn set_dependencies(&mut self, dependencies: Vec<usize>) {
        self.dependencies = dependencies;
    }

    pub(crate) fn dependency_indices(&self) -> &[usize] {
        &self.dependencies
    }

    /// Dispatch one lifecycle callback on the held instance.
    pub(crate) async fn invoke(
        &self,
        phase: LifecyclePhase,
        ctx: &ModuleContext,
    ) -> anyhow::Result<()> {
        let mut instance = self.instance.write().await;
        match phase {
            LifecyclePhase::PreInitialize => instance.pre_initialize(ctx).await,
            LifecyclePhase::Initialize => instance.initialize(ctx).await,
            LifecyclePhase::PostInitialize => instance.post_initialize(ctx).await,
            LifecyclePhase::Shutdown => instance.shutdown(ctx).await,
        }
    }
}

/// The resolved, deduplicated module set for one orchestration run.
///
/// Node collection order is normalized: the kernel node is first and the
/// startup node is last. Topology is never mutated after construction; the
/// orchestrator only reads it.
pub struct ModuleGraph {
    nodes: Vec<ModuleNode>,
    index: HashMap<ModuleId, usize>,
    kernel: usize,
    startup: usize,
}

impl std::fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraph").finish_non_exhaustive()
    }
}

impl ModuleGraph {
    pub(crate) fn new(
        nodes: Vec<ModuleNode>,
        index: HashMap<ModuleId, usize>,
        kernel: usize,
        startup: usize,
    ) -> Self {
        Self {
            nodes,
            index,
            kernel,
            startup,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ModuleNode] {
        &self.nodes
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node(&self, id: ModuleId) -> Option<&ModuleNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// The implicit core module, always ordered first.
    pub fn kernel(&self) -> &ModuleNode {
        &self.nodes[self.kernel]
    }

    /// The host-designated entry module, always ordered last.
    pub fn startup(&self) -> &ModuleNode {
        &self.nodes[self.startup]
    }

    pub(crate) fn kernel_index(&self) -> usize {
        self.kernel
    }

    pub(crate) fn startup_index(&self) -> usize {
        self.startup
    }

    /// Resolved direct dependencies of a node.
    pub fn dependencies_of<'g>(
        &'g self,
        node: &'g ModuleNode,
    ) -> impl Iterator<Item = &'g ModuleNode> {
        node.dependencies.iter().map(|&i| &self.nodes[i])
    }

    /// Read-only view of the graph for host diagnostics.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            startup: self.startup().id().short_name().to_string(),
            modules: self
                .nodes
                .iter()
                .map(|node| ModuleSnapshot {
                    name: node.id().short_name().to_string(),
                    dependencies: node
                        .declared_dependencies()
                        .iter()
                        .map(|d| d.short_name().to_string())
                        .collect(),
                    plugin: node.is_plugin,
                })
                .collect(),
        }
    }
}

/// Serializable description of a resolved module graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub startup: String,
    pub modules: Vec<ModuleSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSnapshot {
    pub name: String,
    pub dependencies: Vec<String>,
    pub plugin: bool,
}
