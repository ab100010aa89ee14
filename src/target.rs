//! Invocation targets.
//!
//! Listeners point at either an object exposing named methods or a plain
//! callable. Objects implement [`EventTarget`]: `responds_to` answers the
//! capability query "does this object expose operation X?" and `call` is the
//! tagged dispatch that runs it.

use std::fmt;
use std::sync::Arc;

use crate::error::EventResult;
use crate::output::Output;
use crate::value::Value;

/// Closure form of a listener.
pub type Callback = Arc<dyn Fn(&[Value], &mut Output) -> EventResult<()> + Send + Sync>;

/// An object whose named methods can be invoked as listeners.
///
/// # Example
///
/// ```
/// use eventry::{EventError, EventResult, EventTarget, Output, Value};
///
/// struct UserMailer;
///
/// impl EventTarget for UserMailer {
///     fn target_name(&self) -> &str {
///         "UserMailer"
///     }
///
///     fn responds_to(&self, method: &str) -> bool {
///         method == "on_save"
///     }
///
///     fn call(&self, method: &str, args: &[Value], out: &mut Output) -> EventResult<()> {
///         match method {
///             "on_save" => {
///                 out.push(format!("mailed {}", args.len()));
///                 Ok(())
///             }
///             other => Err(EventError::listener_failed(format!("unknown method {other}"))),
///         }
///     }
/// }
/// ```
pub trait EventTarget: Send + Sync {
    /// Name used in errors and logs.
    fn target_name(&self) -> &str {
        "target"
    }

    /// Returns true if `method` can be passed to [`EventTarget::call`].
    fn responds_to(&self, method: &str) -> bool;

    /// Runs `method` with positional `args`.
    fn call(&self, method: &str, args: &[Value], out: &mut Output) -> EventResult<()>;
}

/// What a listener is registered against.
///
/// Selectors come from strings of the form `"Type::method"`; callables come
/// from [`ListenerTarget::callable`]. Any other value is rejected by
/// [`IntoListenerTarget`], so [`crate::EventRegistry::listen`] reports it as an
/// invalid target.
#[derive(Clone)]
pub enum ListenerTarget {
    /// A type name and the method to call on its resolved instance.
    Selector {
        /// Type name, also used as the resolver alias.
        type_name: String,
        /// Method invoked on the resolved instance.
        method: String,
    },
    /// A closure invoked directly.
    Callable(Callback),
}

impl ListenerTarget {
    /// Wraps a closure as a listener target.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&[Value], &mut Output) -> EventResult<()> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(f))
    }

    /// Builds a selector target directly, without parsing.
    pub fn selector(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Selector {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// Parses `"Type::method"` using `separator` between the two halves.
    ///
    /// Both halves must be non-empty after trimming, and the separator may
    /// appear only once.
    pub fn parse_selector(selector: &str, separator: &str) -> EventResult<Self> {
        let Some((type_name, method)) = selector.split_once(separator) else {
            return Err(crate::EventError::invalid_target(format!(
                "selector '{selector}' must have the form 'Type{separator}method'"
            )));
        };

        let type_name = type_name.trim();
        let method = method.trim();
        if type_name.is_empty() || method.is_empty() {
            return Err(crate::EventError::invalid_target(format!(
                "selector '{selector}' has an empty type or method"
            )));
        }
        if method.contains(separator) {
            return Err(crate::EventError::invalid_target(format!(
                "selector '{selector}' has more than one '{separator}'"
            )));
        }

        Ok(Self::selector(type_name, method))
    }

    /// Returns true for the closure form.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }
}

impl fmt::Debug for ListenerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector { type_name, method } => f
                .debug_struct("Selector")
                .field("type_name", type_name)
                .field("method", method)
                .finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// Conversion into a [`ListenerTarget`], given the selector separator in use.
///
/// Implemented for strings (parsed as selectors), [`Value`] (strings only)
/// and `ListenerTarget` itself.
pub trait IntoListenerTarget {
    /// Converts `self`, splitting selectors on `separator`.
    ///
    /// # Errors
    /// - `InvalidListenerTarget`: neither a selector nor a callable
    fn into_listener_target(self, separator: &str) -> EventResult<ListenerTarget>;
}

impl IntoListenerTarget for ListenerTarget {
    fn into_listener_target(self, _separator: &str) -> EventResult<ListenerTarget> {
        Ok(self)
    }
}

impl IntoListenerTarget for &str {
    fn into_listener_target(self, separator: &str) -> EventResult<ListenerTarget> {
        ListenerTarget::parse_selector(self, separator)
    }
}

impl IntoListenerTarget for String {
    fn into_listener_target(self, separator: &str) -> EventResult<ListenerTarget> {
        ListenerTarget::parse_selector(&self, separator)
    }
}

impl IntoListenerTarget for &String {
    fn into_listener_target(self, separator: &str) -> EventResult<ListenerTarget> {
        ListenerTarget::parse_selector(self, separator)
    }
}

impl IntoListenerTarget for Value {
    fn into_listener_target(self, separator: &str) -> EventResult<ListenerTarget> {
        match self {
            Value::String(selector) => ListenerTarget::parse_selector(&selector, separator),
            other => Err(crate::EventError::invalid_target(format!(
                "expected a 'Type{separator}method' selector or a callable, got {}",
                other.type_name()
            ))),
        }
    }
}
