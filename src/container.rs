// src/container.rs

//! Injection container supplying compute-function arguments by type.
//!
//! Factories are registered per concrete type; the first `get` for a type
//! invokes its factory and caches the instance, so every compute function in
//! the process sees the same instance (one database handle, one session, one
//! client per type).
//!
//! The container is a collaborator of the [`Runner`](crate::engine::Runner):
//! the runner never inspects what the instances *are*, it only resolves the
//! argument types a compute function declared.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

use crate::types::TypeSpec;

#[derive(Error, Debug)]
pub enum InjectError {
    #[error("no factory registered for type `{0}`")]
    MissingFactory(&'static str),
}

type SharedInstance = Arc<dyn Any + Send + Sync>;

struct FactoryEntry {
    type_name: &'static str,
    build: Box<dyn Fn() -> SharedInstance + Send + Sync>,
}

/// Lazily-populated, one-instance-per-type object store.
#[derive(Default)]
pub struct Container {
    factories: HashMap<TypeId, FactoryEntry>,
    instances: Mutex<HashMap<TypeId, SharedInstance>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `T`. The factory runs at most once, on the
    /// first `get::<T>()`. A second registration for the same type replaces
    /// the factory (but not an already-built instance).
    pub fn register<T, F>(&mut self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let entry = FactoryEntry {
            type_name: std::any::type_name::<T>(),
            build: Box::new(move || Arc::new(factory()) as SharedInstance),
        };
        if self.factories.insert(TypeId::of::<T>(), entry).is_some() {
            debug!(ty = std::any::type_name::<T>(), "replacing container factory");
        }
    }

    /// Seed the container with an already-constructed instance of `T`.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.instances
            .lock()
            .expect("container instance cache poisoned")
            .insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Resolve an instance of `T`, building it from its factory on first use.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectError> {
        let id = TypeId::of::<T>();
        let mut instances = self
            .instances
            .lock()
            .expect("container instance cache poisoned");

        if let Some(existing) = instances.get(&id) {
            let existing = Arc::clone(existing);
            return Ok(existing
                .downcast::<T>()
                .expect("container instance stored under wrong TypeId"));
        }

        let entry = self
            .factories
            .get(&id)
            .ok_or(InjectError::MissingFactory(std::any::type_name::<T>()))?;

        debug!(ty = entry.type_name, "instantiating container object");
        let instance = (entry.build)();
        instances.insert(id, Arc::clone(&instance));

        Ok(instance
            .downcast::<T>()
            .expect("container factory built wrong type"))
    }

    /// Whether an argument of the given type could currently be resolved.
    ///
    /// Used by the validation pass to flag unregistered argument types
    /// without instantiating anything.
    pub fn provides(&self, spec: &TypeSpec) -> bool {
        self.factories.contains_key(&spec.id)
            || self
                .instances
                .lock()
                .expect("container instance cache poisoned")
                .contains_key(&spec.id)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let factories: Vec<&str> = self.factories.values().map(|e| e.type_name).collect();
        f.debug_struct("Container")
            .field("factories", &factories)
            .finish_non_exhaustive()
    }
}
