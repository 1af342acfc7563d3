//! Execution ordering and phase sequencing over a resolved module graph.

use crate::error::{ModulithError, Result};
use crate::lifecycle::{LifecycleError, LifecyclePhase};
use crate::module::{ModuleContext, ModuleGraph};

/// Drives a borrowed module graph through its lifecycle.
///
/// The orchestrator reads nodes and edges, never the topology mutably; the
/// graph can be inspected by the host before, during, and after a run.
pub struct LifecycleOrchestrator<'g> {
    graph: &'g ModuleGraph,
}

impl<'g> LifecycleOrchestrator<'g> {
    pub fn new(graph: &'g ModuleGraph) -> Self {
        Self { graph }
    }

    /// Compute the execution order: a stable topological sort (input order
    /// breaks ties, so identical graphs order identically) with two
    /// placement overrides applied afterwards. The kernel node moves to
    /// index 0 and the startup node to the end, regardless of where the
    /// sort put them.
    ///
    /// Fails with [`ModulithError::CircularDependency`] when the edges
    /// admit no order at all.
    pub fn compute_order(&self) -> Result<Vec<usize>> {
        let nodes = self.graph.nodes();
        let n = nodes.len();

        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            let next = (0..n).find(|&i| {
                !placed[i] && nodes[i].dependency_indices().iter().all(|&d| placed[d])
            });
            match next {
                Some(i) => {
                    placed[i] = true;
                    order.push(i);
                }
                None => {
                    let cycle = nodes
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !placed[*i])
                        .map(|(_, node)| node.id().to_string())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    return Err(ModulithError::CircularDependency { cycle });
                }
            }
        }

        // Placement overrides beat topological position for these two nodes.
        let kernel = self.graph.kernel_index();
        let startup = self.graph.startup_index();
        if let Some(pos) = order.iter().position(|&i| i == kernel) {
            order.remove(pos);
            order.insert(0, kernel);
        }
        if startup != kernel {
            if let Some(pos) = order.iter().position(|&i| i == startup) {
                order.remove(pos);
                order.push(startup);
            }
        }

        Ok(order)
    }

    /// Run the three startup phases, each as a full pass over the order.
    ///
    /// The first failing callback aborts the run; modules that already
    /// completed a phase stay as they are.
    pub async fn run_startup(
        &self,
        order: &[usize],
        ctx: &ModuleContext,
    ) -> std::result::Result<(), LifecycleError> {
        for phase in LifecyclePhase::STARTUP {
            self.run_phase(phase, order, ctx).await?;
        }
        Ok(())
    }

    async fn run_phase(
        &self,
        phase: LifecyclePhase,
        order: &[usize],
        ctx: &ModuleContext,
    ) -> std::result::Result<(), LifecycleError> {
        tracing::info!(modules = order.len(), "running {phase}");

        for &i in order {
            let node = &self.graph.nodes()[i];
            tracing::debug!(module = %node.id(), "{phase}");
            node.invoke(phase, ctx).await.map_err(|e| {
                tracing::error!(module = %node.id(), "{phase} failed: {e:#}");
                LifecycleError::phase_failed(node.id(), phase, e)
            })?;
        }
        Ok(())
    }

    /// Walk the reversed order invoking each module's shutdown callback
    /// once. Failures are logged and the walk continues; by the time this
    /// runs the process is on its way out.
    pub async fn run_shutdown(&self, order: &[usize], ctx: &ModuleContext) {
        tracing::debug!("module shutdown started");

        for &i in order.iter().rev() {
            let node = &self.graph.nodes()[i];
            tracing::debug!(module = %node.id(), "shutdown");
            if let Err(e) = node.invoke(LifecyclePhase::Shutdown, ctx).await {
                tracing::error!(module = %node.id(), "shutdown failed: {e:#}");
            }
        }

        tracing::info!("module shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigService;
    use crate::di::Container;
    use crate::module::{Module, ModuleDefinition, ModuleId, ModuleRegistry};
    use crate::plugin::{PluginRegistry, StaticPluginSource};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        fail_phase: Option<LifecyclePhase>,
    }

    impl Probe {
        fn record(&self, phase: LifecyclePhase) -> anyhow::Result<()> {
            if self.fail_phase == Some(phase) {
                anyhow::bail!("{} refused {phase}", self.name);
            }
            self.log.lock().unwrap().push(format!("{}:{phase}", self.name));
            Ok(())
        }
    }

    #[async_trait]
    impl Module for Probe {
        async fn pre_initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
            self.record(LifecyclePhase::PreInitialize)
        }
        async fn initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
            self.record(LifecyclePhase::Initialize)
        }
        async fn post_initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
            self.record(LifecyclePhase::PostInitialize)
        }
        async fn shutdown(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
            self.record(LifecyclePhase::Shutdown)
        }
    }

    // Identity markers; the probe instances behind them share one log.
    struct A;
    struct B;
    struct C;

    fn probe_def<T: 'static>(
        name: &'static str,
        deps: Vec<ModuleId>,
        log: &Log,
        fail_phase: Option<LifecyclePhase>,
    ) -> ModuleDefinition {
        let log = log.clone();
        ModuleDefinition::with_factory(ModuleId::of::<T>(), deps, move |_| {
            Ok(Box::new(Probe {
                name,
                log: log.clone(),
                fail_phase,
            }))
        })
    }

    fn build_graph(
        definitions: Vec<ModuleDefinition>,
        startup: ModuleId,
    ) -> (ModuleGraph, ModuleContext) {
        build_graph_with_plugins(definitions, Vec::new(), startup)
    }

    fn build_graph_with_plugins(
        definitions: Vec<ModuleDefinition>,
        plugin_definitions: Vec<ModuleDefinition>,
        startup: ModuleId,
    ) -> (ModuleGraph, ModuleContext) {
        let container = Arc::new(Container::new());
        for definition in definitions {
            container.register_module_definition(definition);
        }
        let plugins = Arc::new(PluginRegistry::new());
        if !plugin_definitions.is_empty() {
            plugins.add_source(StaticPluginSource::new(plugin_definitions));
        }
        let graph = ModuleRegistry::new(container.clone(), plugins)
            .build_graph(startup)
            .unwrap();
        let ctx = ModuleContext::new(container, Arc::new(ConfigService::new()));
        (graph, ctx)
    }

    fn order_names(graph: &ModuleGraph, order: &[usize]) -> Vec<&'static str> {
        order
            .iter()
            .map(|&i| graph.nodes()[i].id().short_name())
            .collect()
    }

    fn chain_defs(log: &Log) -> Vec<ModuleDefinition> {
        // A -> B -> C
        vec![
            probe_def::<A>("A", vec![ModuleId::of::<B>()], log, None),
            probe_def::<B>("B", vec![ModuleId::of::<C>()], log, None),
            probe_def::<C>("C", vec![], log, None),
        ]
    }

    #[test]
    fn chain_orders_dependencies_first() {
        let log = Log::default();
        let (graph, _ctx) = build_graph(chain_defs(&log), ModuleId::of::<A>());

        let order = LifecycleOrchestrator::new(&graph).compute_order().unwrap();

        assert_eq!(order_names(&graph, &order), vec!["KernelModule", "C", "B", "A"]);
    }

    #[test]
    fn every_node_follows_its_dependencies() {
        let log = Log::default();
        struct D;
        struct E;
        let defs = vec![
            probe_def::<A>(
                "A",
                vec![ModuleId::of::<B>(), ModuleId::of::<D>()],
                &log,
                None,
            ),
            probe_def::<B>("B", vec![ModuleId::of::<C>(), ModuleId::of::<E>()], &log, None),
            probe_def::<C>("C", vec![], &log, None),
            probe_def::<D>("D", vec![ModuleId::of::<E>()], &log, None),
            probe_def::<E>("E", vec![], &log, None),
        ];
        let (graph, _ctx) = build_graph(defs, ModuleId::of::<A>());

        let order = LifecycleOrchestrator::new(&graph).compute_order().unwrap();

        let pos = |i: usize| order.iter().position(|&o| o == i).unwrap();
        for (i, node) in graph.nodes().iter().enumerate() {
            if i == graph.kernel_index() || i == graph.startup_index() {
                continue;
            }
            for &dep in node.dependency_indices() {
                assert!(pos(dep) < pos(i), "dependency ran after its dependent");
            }
        }
        assert_eq!(order[0], graph.kernel_index());
        assert_eq!(*order.last().unwrap(), graph.startup_index());
    }

    #[test]
    fn independent_modules_keep_input_order() {
        let log = Log::default();
        let defs = vec![
            probe_def::<A>(
                "A",
                vec![ModuleId::of::<B>(), ModuleId::of::<C>()],
                &log,
                None,
            ),
            probe_def::<B>("B", vec![], &log, None),
            probe_def::<C>("C", vec![], &log, None),
        ];
        let (graph, _ctx) = build_graph(defs, ModuleId::of::<A>());

        let order = LifecycleOrchestrator::new(&graph).compute_order().unwrap();

        // B and C have no relative constraint; discovery order decides.
        assert_eq!(order_names(&graph, &order), vec!["KernelModule", "B", "C", "A"]);
    }

    #[test]
    fn startup_stays_last_even_with_dependents() {
        let log = Log::default();
        // B depends on the startup module and arrives via a plugin, so the
        // sort alone would place it after A. The placement override wins.
        let (graph, _ctx) = build_graph_with_plugins(
            vec![probe_def::<A>("A", vec![], &log, None)],
            vec![probe_def::<B>("B", vec![ModuleId::of::<A>()], &log, None)],
            ModuleId::of::<A>(),
        );

        let order = LifecycleOrchestrator::new(&graph).compute_order().unwrap();

        assert_eq!(order_names(&graph, &order), vec!["KernelModule", "B", "A"]);
    }

    #[test]
    fn unbreakable_cycle_is_reported() {
        let log = Log::default();
        let defs = vec![
            probe_def::<A>("A", vec![ModuleId::of::<B>()], &log, None),
            probe_def::<B>("B", vec![ModuleId::of::<A>()], &log, None),
        ];
        let (graph, _ctx) = build_graph(defs, ModuleId::of::<A>());

        let err = LifecycleOrchestrator::new(&graph).compute_order().unwrap_err();
        assert!(matches!(err, ModulithError::CircularDependency { .. }));
    }

    #[tokio::test]
    async fn startup_runs_three_full_passes() {
        let log = Log::default();
        let (graph, ctx) = build_graph(chain_defs(&log), ModuleId::of::<A>());
        let orchestrator = LifecycleOrchestrator::new(&graph);
        let order = orchestrator.compute_order().unwrap();

        orchestrator.run_startup(&order, &ctx).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "C:pre-initialize",
                "B:pre-initialize",
                "A:pre-initialize",
                "C:initialize",
                "B:initialize",
                "A:initialize",
                "C:post-initialize",
                "B:post-initialize",
                "A:post-initialize",
            ]
        );
    }

    #[tokio::test]
    async fn failing_initialize_aborts_without_rollback() {
        let log = Log::default();
        let defs = vec![
            probe_def::<A>("A", vec![ModuleId::of::<B>()], &log, None),
            probe_def::<B>(
                "B",
                vec![ModuleId::of::<C>()],
                &log,
                Some(LifecyclePhase::Initialize),
            ),
            probe_def::<C>("C", vec![], &log, None),
        ];
        let (graph, ctx) = build_graph(defs, ModuleId::of::<A>());
        let orchestrator = LifecycleOrchestrator::new(&graph);
        let order = orchestrator.compute_order().unwrap();

        let err = orchestrator.run_startup(&order, &ctx).await.unwrap_err();

        match err {
            LifecycleError::PhaseFailed { module, phase, .. } => {
                assert_eq!(module, ModuleId::of::<B>());
                assert_eq!(phase, LifecyclePhase::Initialize);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Pre-initialize completed everywhere, initialize stopped at B and
        // nothing after it ran; completed callbacks stay completed.
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "C:pre-initialize",
                "B:pre-initialize",
                "A:pre-initialize",
                "C:initialize",
            ]
        );
    }

    #[tokio::test]
    async fn shutdown_reverses_the_startup_order() {
        let log = Log::default();
        let (graph, ctx) = build_graph(chain_defs(&log), ModuleId::of::<A>());
        let orchestrator = LifecycleOrchestrator::new(&graph);
        let order = orchestrator.compute_order().unwrap();

        orchestrator.run_startup(&order, &ctx).await.unwrap();
        log.lock().unwrap().clear();
        orchestrator.run_shutdown(&order, &ctx).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["A:shutdown", "B:shutdown", "C:shutdown"]
        );
    }

    #[tokio::test]
    async fn shutdown_keeps_going_past_failures() {
        let log = Log::default();
        let defs = vec![
            probe_def::<A>("A", vec![ModuleId::of::<B>()], &log, None),
            probe_def::<B>(
                "B",
                vec![ModuleId::of::<C>()],
                &log,
                Some(LifecyclePhase::Shutdown),
            ),
            probe_def::<C>("C", vec![], &log, None),
        ];
        let (graph, ctx) = build_graph(defs, ModuleId::of::<A>());
        let orchestrator = LifecycleOrchestrator::new(&graph);
        let order = orchestrator.compute_order().unwrap();

        orchestrator.run_shutdown(&order, &ctx).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["A:shutdown", "C:shutdown"]
        );
    }
}
