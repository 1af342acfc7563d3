use crate::di::Container;
use crate::error::Result;
use crate::module::Module;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Opaque handle naming a module type.
///
/// Equality is by type identity, not structure: two ids compare equal only
/// when they were built from the same Rust type. The type name is carried
/// along for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    type_id: TypeId,
    name: &'static str,
}

impl ModuleId {
    pub fn of<M: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: std::any::type_name::<M>(),
        }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its leading path segments.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.name)
    }
}

type ModuleFactory = Arc<dyn Fn(&Container) -> Result<Box<dyn Module>> + Send + Sync>;

/// Everything needed to place a module into the graph: its identity, its
/// declared dependencies, and a factory that builds the live instance.
///
/// Definitions are what hosts register up front and what plugin sources
/// contribute at discovery time.
#[derive(Clone)]
pub struct ModuleDefinition {
    id: ModuleId,
    dependencies: Vec<ModuleId>,
    factory: ModuleFactory,
}

impl ModuleDefinition {
    /// Definition for a module constructed via `Default`.
    pub fn new<M: Module + Default + 'static>(dependencies: Vec<ModuleId>) -> Self {
        Self {
            id: ModuleId::of::<M>(),
            dependencies,
            factory: Arc::new(|_| Ok(Box::new(M::default()))),
        }
    }

    /// Definition with a custom factory, for modules that pull their own
    /// collaborators out of the container while being constructed.
    pub fn with_factory<F>(id: ModuleId, dependencies: Vec<ModuleId>, factory: F) -> Self
    where
        F: Fn(&Container) -> Result<Box<dyn Module>> + Send + Sync + 'static,
    {
        Self {
            id,
            dependencies,
            factory: Arc::new(factory),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Directly declared dependency identities, in declaration order.
    pub fn dependencies(&self) -> &[ModuleId] {
        &self.dependencies
    }

    pub(crate) fn instantiate(&self, container: &Container) -> Result<Box<dyn Module>> {
        (self.factory)(container)
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
