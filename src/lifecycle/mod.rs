//! Staged lifecycle orchestration
//!
//! Startup drives the resolved module graph through three full passes:
//!
//! ```text
//! 1. Graph resolution (dependency closure + plugins)
//!    ↓
//! 2. pre-initialize   (every module, dependency order)
//!    ↓
//! 3. initialize       (every module, dependency order)
//!    ↓
//! 4. post-initialize  (every module, dependency order)
//!    ↓
//! [Running...]
//!    ↓
//! 5. shutdown         (every module, reverse order, best effort)
//! ```
//!
//! Each phase completes across the whole order before the next begins, so a
//! module's `initialize` can rely on every other module (including ones
//! later in the order) having finished `pre-initialize`. Shutdown walks the
//! same order reversed and keeps going past individual failures.
//!
//! Execution is deliberately sequential: one callback in flight at a time,
//! no per-phase parallelism, no timeouts, no cancellation. Modules exist to
//! order side effects against each other; racing them would defeat that.

mod application;
mod error;
mod manager;
mod orchestrator;
mod shutdown;

pub use application::{Application, ApplicationBuilder};
pub use error::LifecycleError;
pub use manager::ModuleManager;
pub use orchestrator::LifecycleOrchestrator;
pub use shutdown::shutdown_signal;

use strum_macros::{Display, EnumIter};

/// The four lifecycle callbacks, in the order startup/shutdown visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum LifecyclePhase {
    PreInitialize,
    Initialize,
    PostInitialize,
    Shutdown,
}

impl LifecyclePhase {
    /// Startup phases, in execution order. Shutdown runs separately, over
    /// the reversed module order.
    pub const STARTUP: [LifecyclePhase; 3] = [
        LifecyclePhase::PreInitialize,
        LifecyclePhase::Initialize,
        LifecyclePhase::PostInitialize,
    ];
}
