//! # eventry - In-process event registry and dispatcher
//!
//! Callers register named listeners and later trigger events by name. Matching
//! listeners run synchronously in priority order, and whatever they write to
//! the dispatch [`Output`] is returned to the trigger caller.
//!
//! ## Core Concepts
//!
//! - **Listener**: an event name, a resolver alias for its target, an optional
//!   method, and optional regex rules that gate when it fires
//! - **Resolver**: turns an alias into a live target at dispatch time, so
//!   registering a listener never constructs anything
//! - **EventTarget**: an object exposing named methods; replaces reflection
//! - **EventRegistry**: owns listeners by event name and priority and runs them
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use eventry::{EventRegistry, EventResult, EventTarget, InMemoryResolver, Output, Resolver, Value};
//!
//! #[derive(Default)]
//! struct UserMailer;
//!
//! impl EventTarget for UserMailer {
//!     fn responds_to(&self, method: &str) -> bool {
//!         method == "on_save"
//!     }
//!
//!     fn call(&self, _method: &str, args: &[Value], out: &mut Output) -> EventResult<()> {
//!         let user = args.first().and_then(Value::as_str).unwrap_or("someone");
//!         out.push(format!("welcome mail for {user}"));
//!         Ok(())
//!     }
//! }
//!
//! let resolver = Arc::new(InMemoryResolver::new());
//! resolver.define_default::<UserMailer>("UserMailer")?;
//!
//! let mut registry = EventRegistry::new(resolver as Arc<dyn Resolver>);
//! registry
//!     .listen("saved", "UserMailer::on_save")?
//!     .with_rule("module", "users|accounts");
//!
//! let out = registry.dispatch("saved").rule("module", "users").arg("ada").send()?;
//! assert_eq!(out, "welcome mail for ada");
//! # Ok::<(), eventry::EventError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod listener;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod target;
pub mod value;

// Re-export primary types at crate root for convenience
pub use error::{EventError, EventResult, ExecutionError, ValidationError};
pub use listener::{Listener, ListenerId, ListenerInfo};
pub use output::Output;
pub use registry::{
    Dispatch, DispatchPolicy, DispatchReport, EventRegistry, ListenerFailure, PriorityListeners,
    RegistryConfig, RuleValues,
};
pub use resolver::{Binding, Factory, InMemoryResolver, Resolved, Resolver};
pub use target::{Callback, EventTarget, IntoListenerTarget, ListenerTarget};
pub use value::Value;
