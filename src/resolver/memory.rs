//! In-memory resolver.
//!
//! Thread-safe, `RwLock`-guarded implementation of [`Resolver`]. Besides
//! explicit alias bindings it keeps a type catalog: named constructors that
//! `"Type::method"` selectors refer to. An alias with no binding that matches
//! a catalog entry is built on the fly, without caching.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{EventError, EventResult, ExecutionError};
use crate::target::EventTarget;

use super::traits::{Binding, Factory, Resolved, Resolver};

fn lock_err(context: &'static str) -> EventError {
    EventError::internal(format!("poisoned lock: {context}"))
}

fn unresolvable(alias: &str) -> EventError {
    EventError::Execution(ExecutionError::UnresolvableAlias {
        alias: alias.to_string(),
    })
}

#[derive(Clone)]
struct BindingEntry {
    binding: Binding,
    shared: bool,
}

#[derive(Default)]
struct ResolverState {
    bindings: HashMap<String, BindingEntry>,
    types: HashMap<String, Factory>,
    shared_instances: HashMap<String, Resolved>,
}

/// Thread-safe in-memory resolver with a type catalog.
#[derive(Default)]
pub struct InMemoryResolver {
    state: RwLock<ResolverState>,
}

impl InMemoryResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named constructor to the type catalog.
    ///
    /// Selectors such as `"UserMailer::on_save"` resolve through the catalog
    /// entry named `UserMailer`.
    pub fn define<F>(&self, type_name: impl Into<String>, factory: F) -> EventResult<()>
    where
        F: Fn() -> EventResult<Arc<dyn EventTarget>> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        let mut state = self.state.write().map_err(|_| lock_err("resolver.define"))?;
        tracing::debug!(type_name = %type_name, "defined resolver type");
        state.types.insert(type_name, Arc::new(factory));
        Ok(())
    }

    /// Add a catalog entry built with `T::default()`.
    pub fn define_default<T>(&self, type_name: impl Into<String>) -> EventResult<()>
    where
        T: EventTarget + Default + 'static,
    {
        self.define(type_name, || Ok(Arc::new(T::default()) as Arc<dyn EventTarget>))
    }

    /// Returns true if the type catalog knows `type_name`.
    pub fn is_defined(&self, type_name: &str) -> EventResult<bool> {
        let state = self.state.read().map_err(|_| lock_err("resolver.is_defined"))?;
        Ok(state.types.contains_key(type_name))
    }

    /// Number of explicit alias bindings.
    pub fn len(&self) -> EventResult<usize> {
        let state = self.state.read().map_err(|_| lock_err("resolver.len"))?;
        Ok(state.bindings.len())
    }

    /// Returns true if no alias is bound.
    pub fn is_empty(&self) -> EventResult<bool> {
        Ok(self.len()? == 0)
    }

    fn build_type(&self, type_name: &str) -> EventResult<Resolved> {
        let factory = {
            let state = self.state.read().map_err(|_| lock_err("resolver.build_type"))?;
            state.types.get(type_name).cloned()
        };
        // Factories run without the lock held; they may resolve other aliases.
        let factory = factory.ok_or_else(|| unresolvable(type_name))?;
        Ok(Resolved::Object(factory()?))
    }

    fn build(&self, binding: &Binding) -> EventResult<Resolved> {
        match binding {
            Binding::Type(type_name) => self.build_type(type_name),
            Binding::Factory(factory) => Ok(Resolved::Object(factory()?)),
            Binding::Instance(target) => Ok(Resolved::Object(Arc::clone(target))),
            Binding::Callable(callback) => Ok(Resolved::Callable(Arc::clone(callback))),
        }
    }
}

impl Resolver for InMemoryResolver {
    fn register(&self, alias: &str, binding: Binding, shared: bool) -> EventResult<()> {
        let mut state = self.state.write().map_err(|_| lock_err("resolver.register"))?;
        tracing::debug!(alias, kind = binding.kind(), shared, "registered resolver binding");
        state.shared_instances.remove(alias);
        state
            .bindings
            .insert(alias.to_string(), BindingEntry { binding, shared });
        Ok(())
    }

    fn registered(&self, alias: &str) -> EventResult<bool> {
        let state = self.state.read().map_err(|_| lock_err("resolver.registered"))?;
        Ok(state.bindings.contains_key(alias))
    }

    fn resolve(&self, alias: &str) -> EventResult<Resolved> {
        let entry = {
            let state = self.state.read().map_err(|_| lock_err("resolver.resolve"))?;
            if let Some(instance) = state.shared_instances.get(alias) {
                return Ok(instance.clone());
            }
            state.bindings.get(alias).cloned()
        };

        let Some(entry) = entry else {
            tracing::trace!(alias, "no binding, falling back to type catalog");
            return self.build_type(alias);
        };

        let resolved = self.build(&entry.binding)?;
        if !entry.shared {
            return Ok(resolved);
        }

        let mut state = self.state.write().map_err(|_| lock_err("resolver.resolve"))?;
        // Another caller may have built the shared instance while we were.
        Ok(state
            .shared_instances
            .entry(alias.to_string())
            .or_insert(resolved)
            .clone())
    }
}

impl fmt::Debug for InMemoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("InMemoryResolver");
        match self.state.read() {
            Ok(state) => s
                .field("bindings", &state.bindings.len())
                .field("types", &state.types.len())
                .field("shared_instances", &state.shared_instances.len()),
            Err(_) => s.field("state", &"<poisoned>"),
        };
        s.finish()
    }
}
