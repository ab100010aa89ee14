//! Registered listeners.
//!
//! A listener records which event it answers to, the resolver alias of its
//! target, and optionally the method to call on that target. Rules narrow
//! when it fires: each rule is a regular expression that must fully match the
//! value supplied under the same name at trigger time.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EventError, EventResult, ExecutionError, ValidationError};
use crate::output::Output;
use crate::resolver::{Resolved, Resolver};
use crate::value::Value;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new random listener id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rule pattern, compiled on first use.
#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    compiled: OnceLock<Regex>,
}

impl Rule {
    fn new(pattern: String) -> Self {
        Self {
            pattern,
            compiled: OnceLock::new(),
        }
    }

    fn regex(&self, rule: &str) -> EventResult<&Regex> {
        if let Some(re) = self.compiled.get() {
            return Ok(re);
        }

        let malformed = |e: regex::Error| {
            EventError::Validation(ValidationError::MalformedRulePattern {
                rule: rule.to_string(),
                pattern: self.pattern.clone(),
                reason: e.to_string(),
            })
        };

        // The bare pattern must parse by itself, or an unbalanced group could
        // close the anchoring wrapper early.
        Regex::new(&self.pattern).map_err(malformed)?;
        let re = Regex::new(&format!("^(?:{})$", self.pattern)).map_err(malformed)?;
        Ok(self.compiled.get_or_init(|| re))
    }
}

/// A callback registered for one event name.
#[derive(Debug, Clone)]
pub struct Listener {
    id: ListenerId,
    name: String,
    alias: String,
    method: Option<String>,
    rules: BTreeMap<String, Rule>,
    registered_at: DateTime<Utc>,
}

impl Listener {
    /// Creates a listener for event `name` targeting resolver alias `alias`.
    ///
    /// Nothing is resolved here; the alias is looked up on every invoke.
    #[must_use]
    pub fn new(name: impl Into<String>, alias: impl Into<String>, method: Option<String>) -> Self {
        Self {
            id: ListenerId::new(),
            name: name.into(),
            alias: alias.into(),
            method,
            rules: BTreeMap::new(),
            registered_at: Utc::now(),
        }
    }

    /// Identifier assigned at registration.
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Event name this listener answers to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolver alias of the target.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Method called on the resolved object, if any.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// When the listener was registered.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Stored pattern for `rule`, if declared.
    #[must_use]
    pub fn rule(&self, rule: &str) -> Option<&str> {
        self.rules.get(rule).map(|r| r.pattern.as_str())
    }

    /// Number of declared rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Adds a named pattern that must match for the listener to fire.
    ///
    /// Overwrites an existing pattern of the same name. The pattern is not
    /// checked here; a malformed one is reported the first time it is matched.
    pub fn with_rule(&mut self, rule: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.rules.insert(rule.into(), Rule::new(pattern.into()));
        self
    }

    /// Applies [`Listener::with_rule`] for every pair, in iteration order.
    pub fn with_rules<I, K, P>(&mut self, rules: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        for (rule, pattern) in rules {
            self.with_rule(rule, pattern);
        }
        self
    }

    /// Checks `value` against the pattern declared for `rule`.
    ///
    /// A rule this listener never declared places no restriction and passes.
    ///
    /// # Errors
    /// - `MalformedRulePattern`: the stored pattern is not a valid regex
    pub fn matches(&self, rule: &str, value: &str) -> EventResult<bool> {
        let Some(declared) = self.rules.get(rule) else {
            return Ok(true);
        };
        Ok(declared.regex(rule)?.is_match(value))
    }

    /// Returns true if every supplied `(rule, value)` pair matches.
    ///
    /// Stops at the first pair that does not match.
    pub fn matches_all<'a, I>(&self, values: I) -> EventResult<bool>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (rule, value) in values {
            if !self.matches(rule, value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Resolves the target and calls it with `args`.
    ///
    /// With a method set, the alias must resolve to an object that responds to
    /// it. Without one, the alias must resolve to a callable.
    pub fn invoke(&self, resolver: &dyn Resolver, args: &[Value], out: &mut Output) -> EventResult<()> {
        let resolved = resolver.resolve(&self.alias)?;

        match (self.method.as_deref(), resolved) {
            (Some(method), Resolved::Object(target)) => {
                if !target.responds_to(method) {
                    return Err(EventError::Execution(ExecutionError::MethodNotFound {
                        target: target.target_name().to_string(),
                        method: method.to_string(),
                    }));
                }
                target.call(method, args, out)
            }
            (None, Resolved::Callable(callback)) => callback(args, out),
            (Some(method), Resolved::Callable(_)) => {
                Err(EventError::Execution(ExecutionError::NotAnObject {
                    alias: self.alias.clone(),
                    method: method.to_string(),
                }))
            }
            (None, Resolved::Object(_)) => Err(EventError::Execution(ExecutionError::NotCallable {
                alias: self.alias.clone(),
            })),
        }
    }

    /// Serializable snapshot of this listener.
    #[must_use]
    pub fn info(&self, priority: i32) -> ListenerInfo {
        ListenerInfo {
            id: self.id,
            name: self.name.clone(),
            alias: self.alias.clone(),
            method: self.method.clone(),
            priority,
            rules: self
                .rules
                .iter()
                .map(|(k, r)| (k.clone(), r.pattern.clone()))
                .collect(),
            registered_at: self.registered_at,
        }
    }
}

/// Serializable description of a registered listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerInfo {
    /// Listener identifier.
    pub id: ListenerId,
    /// Event name.
    pub name: String,
    /// Resolver alias of the target.
    pub alias: String,
    /// Method called on the resolved object; absent for callables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Priority group the listener sits in.
    pub priority: i32,
    /// Rule name to raw pattern.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, String>,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resolver::{Binding, InMemoryResolver};
    use crate::target::EventTarget;

    struct Greeter;

    impl EventTarget for Greeter {
        fn target_name(&self) -> &str {
            "Greeter"
        }

        fn responds_to(&self, method: &str) -> bool {
            method == "greet"
        }

        fn call(&self, _method: &str, args: &[Value], out: &mut Output) -> EventResult<()> {
            let who = args.first().and_then(Value::as_str).unwrap_or("nobody");
            out.push(format!("hello {who}"));
            Ok(())
        }
    }

    fn resolver_with_greeter() -> InMemoryResolver {
        let resolver = InMemoryResolver::new();
        resolver
            .register("Greeter", Binding::Instance(Arc::new(Greeter)), true)
            .unwrap();
        resolver
    }

    #[test]
    fn test_listener_id() {
        let id1 = ListenerId::new();
        let id2 = ListenerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_no_rules_always_matches() {
        let listener = Listener::new("saved", "Greeter", Some("greet".to_string()));
        assert!(listener.matches("env", "anything").unwrap());
        assert!(listener.matches("", "").unwrap());
        assert!(listener
            .matches_all([("env", "prod"), ("module", "admin")])
            .unwrap());
    }

    #[test]
    fn test_rule_is_anchored() {
        let mut listener = Listener::new("saved", "Greeter", None);
        listener.with_rule("route", "foo");

        assert!(listener.matches("route", "foo").unwrap());
        assert!(!listener.matches("route", "foobar").unwrap());
        assert!(!listener.matches("route", "xfoo").unwrap());
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let mut listener = Listener::new("saved", "Greeter", None);
        listener.with_rule("env", "prod|staging");

        assert!(listener.matches("env", "prod").unwrap());
        assert!(listener.matches("env", "staging").unwrap());
        assert!(!listener.matches("env", "production").unwrap());
    }

    #[test]
    fn test_explicit_anchors_are_accepted() {
        let mut listener = Listener::new("x", "Greeter", None);
        listener.with_rule("env", "^prod$");

        assert!(listener.matches("env", "prod").unwrap());
        assert!(!listener.matches("env", "staging").unwrap());
    }

    #[test]
    fn test_undeclared_rule_is_ignored() {
        let mut listener = Listener::new("x", "Greeter", None);
        listener.with_rule("env", "prod");

        assert!(listener.matches("module", "admin").unwrap());
        assert!(listener.matches_all([("module", "admin"), ("env", "prod")]).unwrap());
        assert!(!listener.matches_all([("module", "admin"), ("env", "dev")]).unwrap());
    }

    #[test]
    fn test_with_rule_overwrites() {
        let mut listener = Listener::new("x", "Greeter", None);
        listener.with_rule("env", "prod").with_rule("env", "dev");

        assert_eq!(listener.rule("env"), Some("dev"));
        assert_eq!(listener.rule_count(), 1);
        assert!(listener.matches("env", "dev").unwrap());
    }

    #[test]
    fn test_with_rules_bulk() {
        let mut listener = Listener::new("x", "Greeter", None);
        listener.with_rules([("env", "prod"), ("module", "admin|blog")]);

        assert_eq!(listener.rule_count(), 2);
        assert!(listener.matches("module", "blog").unwrap());
    }

    #[test]
    fn test_malformed_pattern_fails_at_match_time() {
        let mut listener = Listener::new("x", "Greeter", None);
        listener.with_rule("env", "(unclosed");

        let err = listener.matches("env", "prod").unwrap_err();
        assert!(err.is_malformed_rule());
        // Still reported on the next attempt.
        assert!(listener.matches("env", "prod").unwrap_err().is_malformed_rule());
    }

    #[test]
    fn test_unbalanced_group_cannot_escape_anchoring() {
        // Wrapped as-is this would parse as `^(?:prod)|(staging)$`.
        let mut listener = Listener::new("x", "Greeter", None);
        listener.with_rule("env", "prod)|(staging");

        assert!(listener.matches("env", "qa-staging").unwrap_err().is_malformed_rule());
        assert!(listener.matches("env", "prod").unwrap_err().is_malformed_rule());
        assert!(listener
            .matches_all([("env", "staging")])
            .unwrap_err()
            .is_malformed_rule());
    }

    #[test]
    fn test_invoke_method_on_resolved_object() {
        let resolver = resolver_with_greeter();
        let listener = Listener::new("saved", "Greeter", Some("greet".to_string()));

        let mut out = Output::new();
        listener
            .invoke(&resolver, &[Value::from("ada")], &mut out)
            .unwrap();
        assert_eq!(out.as_str(), "hello ada");
    }

    #[test]
    fn test_invoke_missing_method() {
        let resolver = resolver_with_greeter();
        let listener = Listener::new("saved", "Greeter", Some("wave".to_string()));

        let err = listener.invoke(&resolver, &[], &mut Output::new()).unwrap_err();
        assert!(matches!(
            err,
            EventError::Execution(ExecutionError::MethodNotFound { .. })
        ));
    }

    #[test]
    fn test_invoke_object_without_method_is_not_callable() {
        let resolver = resolver_with_greeter();
        let listener = Listener::new("saved", "Greeter", None);

        let err = listener.invoke(&resolver, &[], &mut Output::new()).unwrap_err();
        assert!(matches!(
            err,
            EventError::Execution(ExecutionError::NotCallable { .. })
        ));
    }

    #[test]
    fn test_invoke_callable() {
        let resolver = InMemoryResolver::new();
        resolver
            .register(
                "event.cb",
                Binding::Callable(Arc::new(|args: &[Value], out: &mut Output| -> EventResult<()> {
                    out.push(format!("{} args", args.len()));
                    Ok(())
                })),
                false,
            )
            .unwrap();

        let listener = Listener::new("x", "event.cb", None);
        let mut out = Output::new();
        listener
            .invoke(&resolver, &[Value::Int(1), Value::Null], &mut out)
            .unwrap();
        assert_eq!(out.as_str(), "2 args");
    }

    #[test]
    fn test_invoke_unresolvable_alias() {
        let resolver = InMemoryResolver::new();
        let listener = Listener::new("x", "Nowhere", Some("run".to_string()));

        let err = listener.invoke(&resolver, &[], &mut Output::new()).unwrap_err();
        assert!(err.is_execution());
    }

    #[test]
    fn test_info_snapshot_serializes() {
        let mut listener = Listener::new("saved", "Greeter", Some("greet".to_string()));
        listener.with_rule("env", "prod");

        let info = listener.info(5);
        assert_eq!(info.priority, 5);
        assert_eq!(info.rules.get("env").map(String::as_str), Some("prod"));

        let json = serde_json::to_string(&info).unwrap();
        let back: ListenerInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
