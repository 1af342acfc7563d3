//! # Modulith
//!
//! Module composition with dependency-ordered, staged lifecycle
//! orchestration for Rust applications.
//!
//! A host declares feature modules, each naming the modules it depends on.
//! Modulith resolves the full transitive set (including anything plugin
//! sources contribute), orders it deterministically, and drives every module
//! through a fixed startup sequence: `pre-initialize`, then `initialize`,
//! then `post-initialize`, each phase completing across all modules before
//! the next begins. At teardown the same order runs in reverse through each
//! module's `shutdown` callback.
//!
//! Two modules get special placement: the implicit [`KernelModule`] always
//! runs first, and the host-designated startup module always runs last.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modulith::prelude::*;
//!
//! // 1. Declare your modules and what they depend on
//! #[derive(Default)]
//! struct DatabaseModule;
//!
//! #[async_trait]
//! impl Module for DatabaseModule {
//!     async fn initialize(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
//!         let url = ctx.config().get_or("database_url", "postgres://localhost/app");
//!         tracing::info!(%url, "connecting");
//!         Ok(())
//!     }
//! }
//! impl ModuleMeta for DatabaseModule {}
//!
//! #[module(depends_on = [DatabaseModule])]
//! #[derive(Default)]
//! struct AppModule;
//!
//! #[async_trait]
//! impl Module for AppModule {}
//!
//! // 2. Compose and run
//! #[tokio::main]
//! async fn main() -> modulith::Result<()> {
//!     let app = Application::builder()
//!         .module::<DatabaseModule>()
//!         .startup_module::<AppModule>()
//!         .build()?;
//!
//!     app.start().await?;
//!     app.run_until_shutdown().await
//! }
//! ```

pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod module;
pub mod plugin;

// Re-export core types
pub use config::ConfigService;
pub use di::Container;
pub use error::{ModulithError, Result};
pub use lifecycle::{
    shutdown_signal, Application, ApplicationBuilder, LifecycleError, LifecyclePhase,
    ModuleManager,
};
pub use module::{
    KernelModule, Module, ModuleContext, ModuleDefinition, ModuleId, ModuleMeta,
};

// Re-export macros
pub use modulith_macro::module;

// Re-export commonly used types from dependencies
pub use anyhow;
pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use modulith::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ConfigService;
    pub use crate::di::Container;
    pub use crate::error::{ModulithError, Result};
    pub use crate::lifecycle::{
        shutdown_signal, Application, ApplicationBuilder, LifecycleError, LifecyclePhase,
        ModuleManager,
    };
    pub use crate::module::{
        GraphSnapshot, KernelModule, Module, ModuleContext, ModuleDefinition, ModuleGraph,
        ModuleId, ModuleMeta, ModuleNode,
    };
    pub use crate::plugin::{PluginArtifact, PluginRegistry, PluginSource, StaticPluginSource};
    pub use modulith_macro::module;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
