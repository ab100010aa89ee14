//! Resolver contract.
//!
//! A listener never holds its target directly. It stores an alias, and the
//! registry asks a [`Resolver`] to turn that alias into something callable
//! at dispatch time. This keeps registration free of construction cost and
//! lets targets be swapped behind the alias.

use std::fmt;
use std::sync::Arc;

use crate::error::EventResult;
use crate::target::{Callback, EventTarget};

/// Builds a fresh target instance.
pub type Factory = Arc<dyn Fn() -> EventResult<Arc<dyn EventTarget>> + Send + Sync>;

/// What an alias is bound to.
#[derive(Clone)]
pub enum Binding {
    /// A type name looked up in the resolver's type catalog on resolve.
    Type(String),
    /// A constructor run on resolve.
    Factory(Factory),
    /// A pre-built instance, returned as-is.
    Instance(Arc<dyn EventTarget>),
    /// A closure, returned as-is.
    Callable(Callback),
}

impl Binding {
    /// Wraps a constructor closure.
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> EventResult<Arc<dyn EventTarget>> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// Short name of the binding kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Type(_) => "type",
            Self::Factory(_) => "factory",
            Self::Instance(_) => "instance",
            Self::Callable(_) => "callable",
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => f.debug_tuple("Type").field(name).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Instance(target) => f.debug_tuple("Instance").field(&target.target_name()).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// A live target produced by [`Resolver::resolve`].
#[derive(Clone)]
pub enum Resolved {
    /// An object with named methods.
    Object(Arc<dyn EventTarget>),
    /// A closure.
    Callable(Callback),
}

impl Resolved {
    /// Returns the object, if this is one.
    #[must_use]
    pub fn as_object(&self) -> Option<&Arc<dyn EventTarget>> {
        match self {
            Self::Object(target) => Some(target),
            Self::Callable(_) => None,
        }
    }

    /// Returns true if two resolutions point at the same allocation.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Callable(a), Self::Callable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(target) => f.debug_tuple("Object").field(&target.target_name()).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// Deferred binding container consulted at dispatch time.
///
/// # Sharing
/// - `shared = true`: the first `resolve` builds the target and every later
///   call returns that same instance
/// - `shared = false`: type and factory bindings build a fresh instance per
///   call; instances and callables resolve to the stored value
pub trait Resolver: Send + Sync {
    /// Bind `alias`, replacing any previous binding.
    fn register(&self, alias: &str, binding: Binding, shared: bool) -> EventResult<()>;

    /// Returns true if `alias` has an explicit binding.
    fn registered(&self, alias: &str) -> EventResult<bool>;

    /// Produce the live target for `alias`.
    ///
    /// # Errors
    /// - `UnresolvableAlias`: nothing is bound and no type of that name is known
    /// - any error returned by a factory
    fn resolve(&self, alias: &str) -> EventResult<Resolved>;
}
