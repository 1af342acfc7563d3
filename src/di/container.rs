use crate::error::{ModulithError, Result};
use crate::module::{ModuleDefinition, ModuleId, ModuleMeta};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Thread-safe registry for application services and module definitions.
///
/// Services are keyed by type and resolved as `Arc<T>`. Module definitions
/// are kept in a separate table keyed by [`ModuleId`], so the same container
/// answers both "give me an instance of this service" and "what does this
/// module declare".
pub struct Container {
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    modules: DashMap<ModuleId, ModuleDefinition>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            modules: DashMap::new(),
        }
    }

    /// Register a service instance, replacing any previous registration.
    pub fn register<T: Send + Sync + 'static>(&self, instance: T) {
        self.register_arc(Arc::new(instance));
    }

    /// Register an already-shared service instance.
    pub fn register_arc<T: Send + Sync + 'static>(&self, instance: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), instance);
    }

    /// Register a service only if the type has no registration yet.
    ///
    /// Returns `true` when the registration was added.
    pub fn register_if_absent<T, F>(&self, init: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        match self.services.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(init()));
                true
            }
        }
    }

    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let entry = self.services.get(&TypeId::of::<T>()).ok_or_else(|| {
            ModulithError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            }
        })?;
        entry
            .value()
            .clone()
            .downcast::<T>()
            .map_err(|_| ModulithError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Register a module type through its static declaration.
    ///
    /// A definition already present for the identity is left untouched.
    pub fn register_module<M: ModuleMeta + Default>(&self) -> bool {
        self.register_module_definition(M::definition())
    }

    /// Register a module definition if its identity is not registered yet.
    ///
    /// Returns `true` when the definition was added.
    pub fn register_module_definition(&self, definition: ModuleDefinition) -> bool {
        match self.modules.entry(definition.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(definition);
                true
            }
        }
    }

    pub fn module_definition(&self, id: ModuleId) -> Option<ModuleDefinition> {
        self.modules.get(&id).map(|d| d.clone())
    }

    pub fn is_module(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }

    /// Look up a module definition, distinguishing "registered as something
    /// that is not a module" from "not registered at all".
    pub(crate) fn require_module(
        &self,
        id: ModuleId,
        required_by: Option<ModuleId>,
    ) -> Result<ModuleDefinition> {
        if let Some(definition) = self.module_definition(id) {
            return Ok(definition);
        }
        if self.services.contains_key(&id.type_id()) {
            Err(ModulithError::InvalidModuleKind { module: id })
        } else {
            Err(ModulithError::UnresolvedDependency {
                module: id,
                required_by,
            })
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
