//! Module declaration and graph resolution
//!
//! A module is a unit of composable application functionality: it names the
//! modules it depends on and takes part in the staged startup/shutdown
//! lifecycle. Declarations are static; a module's dependency list is fixed
//! at author time and never changes based on what else is loaded.
//!
//! Modules are usually declared with the `#[module]` attribute, which
//! implements [`ModuleMeta`]:
//!
//! ```ignore
//! use modulith::{module, Module, async_trait};
//!
//! #[module(depends_on = [DatabaseModule])]
//! #[derive(Default)]
//! pub struct AppModule;
//!
//! #[async_trait]
//! impl Module for AppModule {}
//! ```

mod descriptor;
mod graph;
mod kernel;
mod registry;

pub use descriptor::{ModuleDefinition, ModuleId};
pub use graph::{GraphSnapshot, ModuleGraph, ModuleNode, ModuleSnapshot};
pub use kernel::KernelModule;
pub use registry::ModuleRegistry;

use crate::config::ConfigService;
use crate::di::Container;
use async_trait::async_trait;
use std::sync::Arc;

/// A composable application module.
///
/// All four callbacks default to no-ops; modules override the phases they
/// care about. Each callback is invoked exactly once per orchestration run,
/// one module at a time, in dependency order (reverse order for
/// [`shutdown`](Module::shutdown)).
#[async_trait]
pub trait Module: Send + Sync {
    /// First startup phase. Runs before any module's
    /// [`initialize`](Module::initialize); the usual place to register
    /// services other modules will look up while initializing.
    async fn pre_initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Second startup phase. Every module has completed
    /// [`pre_initialize`](Module::pre_initialize) by the time this runs.
    async fn initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Last startup phase, after every module has initialized.
    async fn post_initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Teardown callback, invoked in reverse startup order. Failures here
    /// are logged and do not stop the remaining modules from shutting down.
    async fn shutdown(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Static declaration contract for a module type.
///
/// This is what graph resolution reads: the module's identity and its
/// declared dependencies, available without constructing an instance.
/// Usually generated by the `#[module]` attribute.
pub trait ModuleMeta: Module + Sized + 'static {
    fn module_id() -> ModuleId {
        ModuleId::of::<Self>()
    }

    /// Directly declared dependencies, in declaration order.
    fn dependencies() -> Vec<ModuleId> {
        Vec::new()
    }

    /// Package the declaration into a registrable definition.
    fn definition() -> ModuleDefinition
    where
        Self: Default,
    {
        ModuleDefinition::new::<Self>(Self::dependencies())
    }
}

/// Handles passed to every lifecycle callback.
#[derive(Clone)]
pub struct ModuleContext {
    container: Arc<Container>,
    config: Arc<ConfigService>,
}

impl ModuleContext {
    pub fn new(container: Arc<Container>, config: Arc<ConfigService>) -> Self {
        Self { container, config }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    /// Shorthand for resolving a service from the container.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> crate::Result<Arc<T>> {
        self.container.resolve::<T>()
    }
}
