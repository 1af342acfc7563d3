use crate::lifecycle::LifecyclePhase;
use crate::module::ModuleId;
use thiserror::Error;

/// Errors raised while driving modules through their lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A startup callback failed. The whole startup sequence stops here;
    /// callbacks that already completed are not rolled back.
    #[error("{phase} failed for module {module}: {message}")]
    PhaseFailed {
        module: ModuleId,
        phase: LifecyclePhase,
        message: String,
    },

    /// Start or shutdown was requested before the module graph was resolved.
    #[error("modules have not been initialized")]
    NotInitialized,
}

impl LifecycleError {
    pub(crate) fn phase_failed(module: ModuleId, phase: LifecyclePhase, err: anyhow::Error) -> Self {
        Self::PhaseFailed {
            module,
            phase,
            message: format!("{err:#}"),
        }
    }
}
