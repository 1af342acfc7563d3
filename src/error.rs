use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::module::ModuleId;

pub type Result<T> = std::result::Result<T, ModulithError>;

#[derive(Debug, Error)]
pub enum ModulithError {
    #[error("dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("{module} is registered but is not a module")]
    InvalidModuleKind { module: ModuleId },

    #[error("could not resolve module {module}{}", fmt_required_by(.required_by))]
    UnresolvedDependency {
        module: ModuleId,
        required_by: Option<ModuleId>,
    },

    #[error("circular module dependency: {cycle}")]
    CircularDependency { cycle: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("internal error: {0}")]
    Internal(String),
}

fn fmt_required_by(required_by: &Option<ModuleId>) -> String {
    match required_by {
        Some(module) => format!(", required by {module}"),
        None => String::new(),
    }
}
