//! Application bootstrap
//!
//! The high-level entry point that wires a container, a plugin registry and
//! a module manager together, so a host can go from module declarations to
//! a running composition in a few lines.

use crate::config::ConfigService;
use crate::di::Container;
use crate::error::{ModulithError, Result};
use crate::lifecycle::{shutdown_signal, ModuleManager};
use crate::module::{
    GraphSnapshot, ModuleContext, ModuleDefinition, ModuleId, ModuleMeta, ModuleNode,
};
use crate::plugin::{PluginRegistry, PluginSource};
use std::sync::Arc;

/// A bootstrapped application: the resolved module graph plus the services
/// and plugin sources it was composed from.
///
/// # Example
///
/// ```rust,no_run
/// use modulith::prelude::*;
///
/// #[derive(Default)]
/// struct AppModule;
///
/// #[async_trait]
/// impl Module for AppModule {}
/// impl ModuleMeta for AppModule {}
///
/// #[tokio::main]
/// async fn main() -> modulith::Result<()> {
///     let app = Application::builder()
///         .startup_module::<AppModule>()
///         .build()?;
///
///     app.start().await?;
///     app.run_until_shutdown().await
/// }
/// ```
pub struct Application {
    container: Arc<Container>,
    plugins: Arc<PluginRegistry>,
    config: Arc<ConfigService>,
    manager: ModuleManager,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application").finish_non_exhaustive()
    }
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn config(&self) -> &Arc<ConfigService> {
        &self.config
    }

    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    /// Read-only view of the resolved module set.
    pub fn modules(&self) -> &[ModuleNode] {
        self.manager.modules()
    }

    pub fn startup_module(&self) -> Option<&ModuleNode> {
        self.manager.startup_module()
    }

    pub fn snapshot(&self) -> Option<GraphSnapshot> {
        self.manager.snapshot()
    }

    /// Run the startup phases across all modules.
    pub async fn start(&self) -> Result<()> {
        self.manager.start_modules().await
    }

    /// Shut all modules down in reverse startup order.
    pub async fn shutdown(&self) -> Result<()> {
        self.manager.shutdown_modules().await
    }

    /// Block until SIGTERM/Ctrl+C, then shut the modules down.
    pub async fn run_until_shutdown(&self) -> Result<()> {
        shutdown_signal().await;
        self.shutdown().await
    }
}

/// Fluent configuration for an [`Application`].
pub struct ApplicationBuilder {
    container: Container,
    plugins: PluginRegistry,
    config: ConfigService,
    startup: Option<ModuleId>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            container: Container::new(),
            plugins: PluginRegistry::new(),
            config: ConfigService::from_env(),
            startup: None,
        }
    }

    /// Register a module by its static declaration.
    pub fn module<M: ModuleMeta + Default>(self) -> Self {
        self.container.register_module::<M>();
        self
    }

    /// Register a module definition, e.g. one with a custom factory.
    pub fn module_definition(self, definition: ModuleDefinition) -> Self {
        self.container.register_module_definition(definition);
        self
    }

    /// Register an application service into the container.
    pub fn service<T: Send + Sync + 'static>(self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Add a plugin source; its modules are folded into the graph.
    pub fn plugin_source<S: PluginSource + 'static>(self, source: S) -> Self {
        self.plugins.add_source(source);
        self
    }

    /// Replace the default environment-seeded configuration.
    pub fn config(mut self, config: ConfigService) -> Self {
        self.config = config;
        self
    }

    /// Designate the startup module. Registers it as a side effect, so the
    /// entry module never needs a separate `module::<M>()` call.
    pub fn startup_module<M: ModuleMeta + Default>(mut self) -> Self {
        self.container.register_module::<M>();
        self.startup = Some(M::module_id());
        self
    }

    /// Resolve the module graph and produce the application.
    ///
    /// Lifecycle callbacks have not run yet; call
    /// [`Application::start`] afterwards.
    pub fn build(self) -> Result<Application> {
        let startup = self
            .startup
            .ok_or_else(|| ModulithError::Internal("no startup module configured".into()))?;

        let container = Arc::new(self.container);
        let plugins = Arc::new(self.plugins);
        let config = Arc::new(self.config);

        let context = ModuleContext::new(container.clone(), config.clone());
        let mut manager = ModuleManager::new(container.clone(), plugins.clone(), context);
        manager.initialize(startup)?;

        Ok(Application {
            container,
            plugins,
            config,
            manager,
        })
    }
}
