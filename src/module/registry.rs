use crate::di::Container;
use crate::error::{ModulithError, Result};
use crate::module::{KernelModule, ModuleGraph, ModuleId, ModuleMeta, ModuleNode};
use crate::plugin::PluginRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Resolves the full module graph for one orchestration run.
///
/// Starting from the host's startup module, the registry walks declared
/// dependencies depth-first, folds in everything the plugin sources
/// contribute, and materializes one [`ModuleNode`] per unique identity with
/// its dependency edges wired.
pub struct ModuleRegistry {
    container: Arc<Container>,
    plugins: Arc<PluginRegistry>,
}

/// Accumulating identity set during discovery. Insertion order is kept: it
/// becomes the input order of the graph, which the orchestrator uses as the
/// deterministic tie-break.
#[derive(Default)]
struct Closure {
    ids: Vec<ModuleId>,
    seen: HashSet<ModuleId>,
    from_plugin: HashSet<ModuleId>,
}

impl Closure {
    fn push(&mut self, id: ModuleId, as_plugin: bool) {
        self.seen.insert(id);
        self.ids.push(id);
        if as_plugin {
            self.from_plugin.insert(id);
        }
    }
}

impl ModuleRegistry {
    pub fn new(container: Arc<Container>, plugins: Arc<PluginRegistry>) -> Self {
        Self { container, plugins }
    }

    /// Build the graph rooted at `startup`.
    ///
    /// Fails with [`ModulithError::UnresolvedDependency`] when a declared
    /// dependency has no registration, and with
    /// [`ModulithError::InvalidModuleKind`] when an identity is registered
    /// as something other than a module. On failure no graph is handed out.
    pub fn build_graph(&self, startup: ModuleId) -> Result<ModuleGraph> {
        // The kernel is implicit; no host or module has to declare it.
        self.container.register_module::<KernelModule>();
        let kernel_id = KernelModule::module_id();

        let mut closure = Closure::default();
        self.collect(&mut closure, startup, None, false)?;
        self.collect(&mut closure, kernel_id, None, false)?;

        // Fold in plugin-contributed modules, expanding each through the
        // same closure rule: plugin modules declare dependencies too.
        let contributed = self.plugins.all_modules();
        for definition in &contributed {
            self.container.register_module_definition(definition.clone());
        }
        for definition in &contributed {
            self.collect(&mut closure, definition.id(), None, true)?;
        }

        // Normalize collection order: kernel first, startup last.
        let mut ids = closure.ids;
        if let Some(pos) = ids.iter().position(|&id| id == kernel_id) {
            let id = ids.remove(pos);
            ids.insert(0, id);
        }
        if startup != kernel_id {
            if let Some(pos) = ids.iter().position(|&id| id == startup) {
                let id = ids.remove(pos);
                ids.push(id);
            }
        }

        // One node per identity; instances come from the definitions'
        // factories against the shared container.
        let mut nodes = Vec::with_capacity(ids.len());
        let mut index = HashMap::with_capacity(ids.len());
        for id in &ids {
            let definition = self.container.require_module(*id, None)?;
            let instance = definition.instantiate(&self.container)?;
            tracing::debug!(module = %id, "loaded module");
            index.insert(*id, nodes.len());
            nodes.push(ModuleNode::new(
                definition,
                instance,
                closure.from_plugin.contains(id),
            ));
        }

        // Second pass: wire dependency edges now that every node exists.
        for i in 0..nodes.len() {
            let declared = nodes[i].declared_dependencies().to_vec();
            let mut edges = Vec::with_capacity(declared.len());
            for dep in declared {
                let j = *index
                    .get(&dep)
                    .ok_or_else(|| ModulithError::UnresolvedDependency {
                        module: dep,
                        required_by: Some(nodes[i].id()),
                    })?;
                if !edges.contains(&j) {
                    edges.push(j);
                }
            }
            nodes[i].set_dependencies(edges);
        }

        tracing::info!(modules = nodes.len(), "module graph loaded");

        let kernel = index[&kernel_id];
        let startup = index[&startup];
        Ok(ModuleGraph::new(nodes, index, kernel, startup))
    }

    /// Depth-first closure discovery. A revisit ends the recursion, which
    /// both resolves diamonds to a single node and terminates on cycles.
    fn collect(
        &self,
        closure: &mut Closure,
        id: ModuleId,
        required_by: Option<ModuleId>,
        as_plugin: bool,
    ) -> Result<()> {
        if closure.seen.contains(&id) {
            return Ok(());
        }

        let definition = self.container.require_module(id, required_by)?;
        closure.push(id, as_plugin);

        for dep in definition.dependencies() {
            self.collect(closure, *dep, Some(id), as_plugin)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Module, ModuleMeta};
    use crate::plugin::StaticPluginSource;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Storage;
    #[async_trait]
    impl Module for Storage {}
    impl ModuleMeta for Storage {}

    #[derive(Default)]
    struct Cache;
    #[async_trait]
    impl Module for Cache {}
    impl ModuleMeta for Cache {
        fn dependencies() -> Vec<ModuleId> {
            vec![Storage::module_id()]
        }
    }

    // Diamond: depends on Cache and Storage, Cache also depends on Storage.
    #[derive(Default)]
    struct App;
    #[async_trait]
    impl Module for App {}
    impl ModuleMeta for App {
        fn dependencies() -> Vec<ModuleId> {
            vec![Cache::module_id(), Storage::module_id()]
        }
    }

    #[derive(Default)]
    struct CycleA;
    #[async_trait]
    impl Module for CycleA {}
    impl ModuleMeta for CycleA {
        fn dependencies() -> Vec<ModuleId> {
            vec![CycleB::module_id()]
        }
    }

    #[derive(Default)]
    struct CycleB;
    #[async_trait]
    impl Module for CycleB {}
    impl ModuleMeta for CycleB {
        fn dependencies() -> Vec<ModuleId> {
            vec![CycleA::module_id()]
        }
    }

    struct NotAModule;

    fn setup() -> (Arc<Container>, Arc<PluginRegistry>, ModuleRegistry) {
        let container = Arc::new(Container::new());
        let plugins = Arc::new(PluginRegistry::new());
        let registry = ModuleRegistry::new(container.clone(), plugins.clone());
        (container, plugins, registry)
    }

    #[test]
    fn closure_covers_transitive_dependencies_and_kernel() {
        let (container, _, registry) = setup();
        container.register_module::<Storage>();
        container.register_module::<Cache>();
        container.register_module::<App>();

        let graph = registry.build_graph(App::module_id()).unwrap();

        assert_eq!(graph.len(), 4);
        assert!(graph.contains(KernelModule::module_id()));
        assert!(graph.contains(Storage::module_id()));
        assert!(graph.contains(Cache::module_id()));
        assert!(graph.contains(App::module_id()));
    }

    #[test]
    fn diamond_resolves_to_one_node() {
        let (container, _, registry) = setup();
        container.register_module::<Storage>();
        container.register_module::<Cache>();
        container.register_module::<App>();

        let graph = registry.build_graph(App::module_id()).unwrap();

        let storage_nodes = graph
            .nodes()
            .iter()
            .filter(|n| n.id() == Storage::module_id())
            .count();
        assert_eq!(storage_nodes, 1);

        // Both dependents point at the same node.
        let app = graph.node(App::module_id()).unwrap();
        assert_eq!(app.declared_dependencies().len(), 2);
        assert_eq!(graph.dependencies_of(app).count(), 2);
    }

    #[test]
    fn kernel_first_startup_last() {
        let (container, _, registry) = setup();
        container.register_module::<Storage>();
        container.register_module::<Cache>();
        container.register_module::<App>();

        let graph = registry.build_graph(App::module_id()).unwrap();

        assert_eq!(graph.nodes()[0].id(), KernelModule::module_id());
        assert_eq!(graph.nodes()[graph.len() - 1].id(), App::module_id());
        assert_eq!(graph.kernel().id(), KernelModule::module_id());
        assert_eq!(graph.startup().id(), App::module_id());
    }

    #[test]
    fn cycle_discovery_terminates() {
        let (container, _, registry) = setup();
        container.register_module::<CycleA>();
        container.register_module::<CycleB>();

        let graph = registry.build_graph(CycleA::module_id()).unwrap();

        assert!(graph.contains(CycleA::module_id()));
        assert!(graph.contains(CycleB::module_id()));
        assert_eq!(graph.len(), 3); // kernel + both cycle members, once each
    }

    #[test]
    fn missing_dependency_is_unresolved() {
        #[derive(Default)]
        struct Orphan;
        #[async_trait]
        impl Module for Orphan {}
        impl ModuleMeta for Orphan {
            fn dependencies() -> Vec<ModuleId> {
                vec![ModuleId::of::<NotAModule>()]
            }
        }

        let (container, _, registry) = setup();
        container.register_module::<Orphan>();

        let err = registry.build_graph(Orphan::module_id()).unwrap_err();
        match err {
            ModulithError::UnresolvedDependency {
                module,
                required_by,
            } => {
                assert_eq!(module, ModuleId::of::<NotAModule>());
                assert_eq!(required_by, Some(Orphan::module_id()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn service_registration_is_not_a_module() {
        #[derive(Default)]
        struct Dependent;
        #[async_trait]
        impl Module for Dependent {}
        impl ModuleMeta for Dependent {
            fn dependencies() -> Vec<ModuleId> {
                vec![ModuleId::of::<NotAModule>()]
            }
        }

        let (container, _, registry) = setup();
        container.register(NotAModule);
        container.register_module::<Dependent>();

        let err = registry.build_graph(Dependent::module_id()).unwrap_err();
        assert!(matches!(err, ModulithError::InvalidModuleKind { module } if module == ModuleId::of::<NotAModule>()));
    }

    #[test]
    fn plugin_modules_fold_into_the_graph() {
        #[derive(Default)]
        struct Contributed;
        #[async_trait]
        impl Module for Contributed {}
        impl ModuleMeta for Contributed {
            fn dependencies() -> Vec<ModuleId> {
                vec![ContributedDep::module_id()]
            }
        }

        #[derive(Default)]
        struct ContributedDep;
        #[async_trait]
        impl Module for ContributedDep {}
        impl ModuleMeta for ContributedDep {}

        let (container, plugins, registry) = setup();
        container.register_module::<App>();
        container.register_module::<Cache>();
        container.register_module::<Storage>();
        plugins.add_source(StaticPluginSource::new(vec![
            Contributed::definition(),
            ContributedDep::definition(),
        ]));

        let graph = registry.build_graph(App::module_id()).unwrap();

        let contributed = graph.node(Contributed::module_id()).unwrap();
        assert!(contributed.is_plugin());
        assert!(graph.node(ContributedDep::module_id()).unwrap().is_plugin());
        // Statically reachable modules keep their non-plugin origin.
        assert!(!graph.node(App::module_id()).unwrap().is_plugin());
    }

    #[test]
    fn plugin_duplicate_of_static_module_is_deduplicated() {
        let (container, plugins, registry) = setup();
        container.register_module::<Storage>();
        container.register_module::<Cache>();
        container.register_module::<App>();
        plugins.add_source(StaticPluginSource::new(vec![Storage::definition()]));

        let graph = registry.build_graph(App::module_id()).unwrap();

        let storage_nodes = graph
            .nodes()
            .iter()
            .filter(|n| n.id() == Storage::module_id())
            .count();
        assert_eq!(storage_nodes, 1);
        assert!(!graph.node(Storage::module_id()).unwrap().is_plugin());
    }

    #[test]
    fn startup_without_dependencies_yields_kernel_and_startup() {
        let (container, _, registry) = setup();
        container.register_module::<Storage>();

        let graph = registry.build_graph(Storage::module_id()).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.nodes()[0].id(), KernelModule::module_id());
        assert_eq!(graph.nodes()[1].id(), Storage::module_id());
    }
}
