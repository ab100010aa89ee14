//! Listener registry and dispatcher.
//!
//! This module owns listener registrations, keyed by event name and then by
//! priority, and runs them when an event is triggered. Dispatch is
//! synchronous: each listener returns before the next one starts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EventError, EventResult, ValidationError};
use crate::listener::{Listener, ListenerId, ListenerInfo};
use crate::output::Output;
use crate::resolver::{Binding, InMemoryResolver, Resolver};
use crate::target::{EventTarget, IntoListenerTarget, ListenerTarget};
use crate::value::Value;

/// Separator between type and method in a selector.
pub const DEFAULT_SELECTOR_SEPARATOR: &str = "::";

/// Prefix of the resolver aliases generated for callables.
pub const DEFAULT_CALLABLE_ALIAS_PREFIX: &str = "event.";

/// Priority used by [`EventRegistry::listen`].
pub const DEFAULT_PRIORITY: i32 = 0;

/// Rule values supplied at trigger time, keyed by rule name.
pub type RuleValues = BTreeMap<String, String>;

/// Listeners for one event, grouped by priority.
pub type PriorityListeners = BTreeMap<i32, Vec<Listener>>;

/// What happens when a listener returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// The first error aborts the trigger and is returned to the caller.
    #[default]
    FailFast,
    /// Errors are logged and recorded in the report; dispatch continues.
    Isolate,
}

/// Registry settings; missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Separator between type and method in selector strings.
    pub selector_separator: String,
    /// Prefix of generated callable aliases.
    pub callable_alias_prefix: String,
    /// How listener errors are handled.
    pub dispatch_policy: DispatchPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            selector_separator: DEFAULT_SELECTOR_SEPARATOR.to_string(),
            callable_alias_prefix: DEFAULT_CALLABLE_ALIAS_PREFIX.to_string(),
            dispatch_policy: DispatchPolicy::FailFast,
        }
    }
}

/// A failure recorded under [`DispatchPolicy::Isolate`].
#[derive(Debug)]
pub struct ListenerFailure {
    /// `None` when the trigger object itself failed.
    pub listener_id: Option<ListenerId>,
    /// Alias or target name that failed.
    pub target: String,
    /// The error it returned.
    pub error: EventError,
}

/// Outcome of one trigger call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Everything listeners wrote during the dispatch.
    pub output: String,
    /// Listeners that completed without error.
    pub invoked: usize,
    /// Listeners passed over because a rule did not match.
    pub skipped: usize,
    /// Whether the trigger object handled the event.
    pub object_invoked: bool,
    /// Errors collected under [`DispatchPolicy::Isolate`].
    pub failures: Vec<ListenerFailure>,
}

impl DispatchReport {
    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry of event listeners.
///
/// # Example
///
/// ```
/// use eventry::{EventRegistry, ListenerTarget};
///
/// let mut registry = EventRegistry::default();
///
/// registry
///     .listen_at("ping", ListenerTarget::callable(|_, out| { out.push("A"); Ok(()) }), 5)
///     .unwrap();
/// registry
///     .listen_at("ping", ListenerTarget::callable(|_, out| { out.push("B"); Ok(()) }), 1)
///     .unwrap();
///
/// assert_eq!(registry.emit("ping").unwrap(), "BA");
/// ```
pub struct EventRegistry {
    resolver: Arc<dyn Resolver>,
    config: RegistryConfig,
    listeners: HashMap<String, PriorityListeners>,
}

impl EventRegistry {
    /// Creates a registry resolving targets through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self::with_config(resolver, RegistryConfig::default())
    }

    /// Creates an empty registry with explicit settings.
    #[must_use]
    pub fn with_config(resolver: Arc<dyn Resolver>, config: RegistryConfig) -> Self {
        Self {
            resolver,
            config,
            listeners: HashMap::new(),
        }
    }

    /// The resolver listener targets are looked up in.
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }

    /// Active settings.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a listener for `name` at [`DEFAULT_PRIORITY`].
    pub fn listen<T>(&mut self, name: impl Into<String>, target: T) -> EventResult<&mut Listener>
    where
        T: IntoListenerTarget,
    {
        self.listen_at(name, target, DEFAULT_PRIORITY)
    }

    /// Registers a listener for `name` at `priority` (lower runs first).
    ///
    /// A selector binds its type name in the resolver as a shared binding,
    /// unless something is already bound under that name. A callable is bound
    /// under a fresh unique alias. The returned listener can be given rules.
    ///
    /// # Errors
    /// - `EmptyEventName`: `name` is empty
    /// - `InvalidListenerTarget`: `target` is neither a selector nor a callable
    pub fn listen_at<T>(
        &mut self,
        name: impl Into<String>,
        target: T,
        priority: i32,
    ) -> EventResult<&mut Listener>
    where
        T: IntoListenerTarget,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyEventName.into());
        }

        let target = target.into_listener_target(&self.config.selector_separator)?;
        let (alias, method) = match target {
            ListenerTarget::Selector { type_name, method } => {
                if !self.resolver.registered(&type_name)? {
                    self.resolver
                        .register(&type_name, Binding::Type(type_name.clone()), true)?;
                }
                (type_name, Some(method))
            }
            ListenerTarget::Callable(callback) => {
                let alias = format!("{}{}", self.config.callable_alias_prefix, Uuid::new_v4());
                self.resolver
                    .register(&alias, Binding::Callable(callback), false)?;
                (alias, None)
            }
        };

        let listener = Listener::new(name.clone(), alias, method);
        tracing::debug!(
            event = %name,
            listener_id = %listener.id(),
            alias = listener.alias(),
            method = listener.method(),
            priority,
            "registered listener"
        );

        let slot = self
            .listeners
            .entry(name)
            .or_default()
            .entry(priority)
            .or_default();
        slot.push(listener);
        slot.last_mut()
            .ok_or_else(|| EventError::internal("listener slot empty after push"))
    }

    /// Listeners for `name`, ascending by priority, registration order within
    /// a priority. Empty for unknown names.
    #[must_use]
    pub fn listeners(&self, name: &str) -> Vec<&Listener> {
        self.listeners
            .get(name)
            .map(|by_priority| by_priority.values().flatten().collect())
            .unwrap_or_default()
    }

    /// The whole registry: event name to listeners by priority.
    #[must_use]
    pub fn all_listeners(&self) -> &HashMap<String, PriorityListeners> {
        &self.listeners
    }

    /// Serializable snapshots of the listeners for `name`, in dispatch order.
    #[must_use]
    pub fn describe(&self, name: &str) -> Vec<ListenerInfo> {
        self.listeners
            .get(name)
            .map(|by_priority| {
                by_priority
                    .iter()
                    .flat_map(|(&priority, group)| group.iter().map(move |l| l.info(priority)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if at least one listener is registered for `name`.
    #[must_use]
    pub fn has_listeners(&self, name: &str) -> bool {
        self.listeners
            .get(name)
            .is_some_and(|by_priority| by_priority.values().any(|group| !group.is_empty()))
    }

    /// Total number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Triggers `name` and returns what listeners wrote.
    ///
    /// See [`EventRegistry::trigger_report`].
    pub fn trigger(
        &self,
        name: &str,
        object: Option<&dyn EventTarget>,
        rules: &RuleValues,
        args: &[Value],
    ) -> EventResult<String> {
        self.trigger_report(name, object, rules, args)
            .map(|report| report.output)
    }

    /// Triggers `name` with no object, rules or arguments.
    pub fn emit(&self, name: &str) -> EventResult<String> {
        self.trigger(name, None, &RuleValues::new(), &[])
    }

    /// Starts building a trigger call.
    pub fn dispatch(&self, name: impl Into<String>) -> Dispatch<'_> {
        Dispatch {
            registry: self,
            name: name.into(),
            object: None,
            rules: RuleValues::new(),
            args: Vec::new(),
        }
    }

    /// Runs every matching listener for `name`, then the trigger object.
    ///
    /// A listener is skipped when any supplied rule it declares does not
    /// match. After the listeners, `object` handles the event if it responds
    /// to a method named `name`.
    ///
    /// # Errors
    /// - `MalformedRulePattern`: always aborts the dispatch
    /// - resolution or listener errors: abort under
    ///   [`DispatchPolicy::FailFast`], recorded under [`DispatchPolicy::Isolate`]
    pub fn trigger_report(
        &self,
        name: &str,
        object: Option<&dyn EventTarget>,
        rules: &RuleValues,
        args: &[Value],
    ) -> EventResult<DispatchReport> {
        let mut out = Output::new();
        let mut report = DispatchReport::default();

        for listener in self.listeners(name) {
            let matched =
                listener.matches_all(rules.iter().map(|(rule, value)| (rule.as_str(), value.as_str())))?;
            if !matched {
                tracing::trace!(event = name, listener_id = %listener.id(), "rules did not match, skipping");
                report.skipped += 1;
                continue;
            }

            match listener.invoke(self.resolver.as_ref(), args, &mut out) {
                Ok(()) => report.invoked += 1,
                Err(error) => self.handle_failure(
                    &mut report,
                    name,
                    Some(listener.id()),
                    listener.alias(),
                    error,
                )?,
            }
        }

        if let Some(object) = object {
            if object.responds_to(name) {
                match object.call(name, args, &mut out) {
                    Ok(()) => report.object_invoked = true,
                    Err(error) => {
                        self.handle_failure(&mut report, name, None, object.target_name(), error)?;
                    }
                }
            }
        }

        tracing::debug!(
            event = name,
            invoked = report.invoked,
            skipped = report.skipped,
            failed = report.failures.len(),
            object_invoked = report.object_invoked,
            "triggered event"
        );

        report.output = out.into_string();
        Ok(report)
    }

    fn handle_failure(
        &self,
        report: &mut DispatchReport,
        event: &str,
        listener_id: Option<ListenerId>,
        target: &str,
        error: EventError,
    ) -> EventResult<()> {
        match self.config.dispatch_policy {
            DispatchPolicy::FailFast => Err(error),
            DispatchPolicy::Isolate => {
                tracing::warn!(event, failed_target = target, error = %error, "listener failed, continuing dispatch");
                report.failures.push(ListenerFailure {
                    listener_id,
                    target: target.to_string(),
                    error,
                });
                Ok(())
            }
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryResolver::new()))
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("config", &self.config)
            .field("events", &self.listeners.len())
            .field("listeners", &self.len())
            .finish_non_exhaustive()
    }
}

/// Builder for a single trigger call.
///
/// ```
/// use eventry::{EventRegistry, ListenerTarget};
///
/// let mut registry = EventRegistry::default();
/// registry
///     .listen("deploy", ListenerTarget::callable(|args, out| {
///         out.push(format!("{}", args.len()));
///         Ok(())
///     }))
///     .unwrap()
///     .with_rule("env", "prod");
///
/// let out = registry.dispatch("deploy").rule("env", "prod").arg(1).arg("x").send().unwrap();
/// assert_eq!(out, "2");
/// ```
#[must_use = "a dispatch does nothing until sent"]
pub struct Dispatch<'r> {
    registry: &'r EventRegistry,
    name: String,
    object: Option<&'r dyn EventTarget>,
    rules: RuleValues,
    args: Vec<Value>,
}

impl<'r> Dispatch<'r> {
    /// Adds a rule value.
    pub fn rule(mut self, rule: impl Into<String>, value: impl Into<String>) -> Self {
        self.rules.insert(rule.into(), value.into());
        self
    }

    /// Adds several rule values.
    pub fn rules<I, K, V>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.rules
            .extend(rules.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Appends several positional arguments.
    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Sets the object offered the event after the listeners.
    pub fn object(mut self, object: &'r dyn EventTarget) -> Self {
        self.object = Some(object);
        self
    }

    /// Runs the dispatch and returns the output.
    pub fn send(self) -> EventResult<String> {
        self.registry
            .trigger(&self.name, self.object, &self.rules, &self.args)
    }

    /// Runs the dispatch and returns the full report.
    pub fn report(self) -> EventResult<DispatchReport> {
        self.registry
            .trigger_report(&self.name, self.object, &self.rules, &self.args)
    }
}
