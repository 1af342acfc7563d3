//! Module Manager
//!
//! Owns one orchestration run: resolve the graph, fix the execution order,
//! then drive startup and shutdown through it.

use crate::di::Container;
use crate::error::Result;
use crate::lifecycle::{LifecycleError, LifecycleOrchestrator};
use crate::module::{
    GraphSnapshot, ModuleContext, ModuleGraph, ModuleId, ModuleNode, ModuleRegistry,
};
use crate::plugin::PluginRegistry;
use std::sync::Arc;
use uuid::Uuid;

/// Host surface for module orchestration.
///
/// The expected call sequence is [`initialize`](ModuleManager::initialize),
/// then [`start_modules`](ModuleManager::start_modules), then, at teardown,
/// [`shutdown_modules`](ModuleManager::shutdown_modules), each exactly once,
/// from a single initiating task. The manager keeps the resolved graph and
/// the execution order between calls; the order is computed once and
/// consumed forward for startup, reversed for shutdown.
pub struct ModuleManager {
    container: Arc<Container>,
    plugins: Arc<PluginRegistry>,
    context: ModuleContext,
    run: Option<OrchestrationRun>,
}

struct OrchestrationRun {
    run_id: Uuid,
    graph: ModuleGraph,
    order: Vec<usize>,
}

impl ModuleManager {
    pub fn new(
        container: Arc<Container>,
        plugins: Arc<PluginRegistry>,
        context: ModuleContext,
    ) -> Self {
        Self {
            container,
            plugins,
            context,
            run: None,
        }
    }

    /// Resolve the module graph rooted at `startup` and fix the execution
    /// order for this run.
    pub fn initialize(&mut self, startup: ModuleId) -> Result<()> {
        let registry = ModuleRegistry::new(self.container.clone(), self.plugins.clone());
        let graph = registry.build_graph(startup)?;
        let order = LifecycleOrchestrator::new(&graph).compute_order()?;

        let run_id = Uuid::new_v4();
        tracing::info!(run = %run_id, modules = graph.len(), startup = %startup, "module graph resolved");

        self.run = Some(OrchestrationRun {
            run_id,
            graph,
            order,
        });
        Ok(())
    }

    /// Drive every module through pre-initialize, initialize and
    /// post-initialize, in execution order.
    pub async fn start_modules(&self) -> Result<()> {
        let run = self.run.as_ref().ok_or(LifecycleError::NotInitialized)?;
        tracing::info!(run = %run.run_id, "starting modules");

        LifecycleOrchestrator::new(&run.graph)
            .run_startup(&run.order, &self.context)
            .await?;

        tracing::info!(run = %run.run_id, "modules started");
        Ok(())
    }

    /// Shut every module down in reverse execution order, best effort.
    pub async fn shutdown_modules(&self) -> Result<()> {
        let run = self.run.as_ref().ok_or(LifecycleError::NotInitialized)?;

        LifecycleOrchestrator::new(&run.graph)
            .run_shutdown(&run.order, &self.context)
            .await;
        Ok(())
    }

    /// Read-only view of the resolved module set. Empty before
    /// [`initialize`](ModuleManager::initialize).
    pub fn modules(&self) -> &[ModuleNode] {
        self.run.as_ref().map(|r| r.graph.nodes()).unwrap_or(&[])
    }

    /// The node for the host-designated startup module, once resolved.
    pub fn startup_module(&self) -> Option<&ModuleNode> {
        self.run.as_ref().map(|r| r.graph.startup())
    }

    pub fn graph(&self) -> Option<&ModuleGraph> {
        self.run.as_ref().map(|r| &r.graph)
    }

    pub fn snapshot(&self) -> Option<GraphSnapshot> {
        self.run.as_ref().map(|r| r.graph.snapshot())
    }

    pub fn context(&self) -> &ModuleContext {
        &self.context
    }
}
