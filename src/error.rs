//! Error types for eventry.
//!
//! All errors are strongly typed using thiserror, split the same way
//! failures are split in practice: bad input at registration time
//! (`ValidationError`) versus failures while resolving or running a
//! listener (`ExecutionError`).

use thiserror::Error;

/// Validation errors caused by caller input or listener configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// `listen` was given something that is neither a selector nor a callable.
    #[error("Invalid listener target: {reason}")]
    InvalidListenerTarget {
        /// What was wrong with it.
        reason: String,
    },

    /// A rule pattern failed to compile.
    #[error("Rule '{rule}' has a malformed pattern '{pattern}': {reason}")]
    MalformedRulePattern {
        /// Rule name.
        rule: String,
        /// Pattern as registered.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// An empty string was used as event name.
    #[error("Event name cannot be empty")]
    EmptyEventName,
}

/// Execution errors raised while resolving or invoking a listener.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The resolver knows neither a binding nor a type for the alias.
    #[error("No binding or type registered for alias '{alias}'")]
    UnresolvableAlias {
        /// Alias looked up.
        alias: String,
    },

    /// The resolved object does not respond to the method.
    #[error("Target '{target}' has no method '{method}'")]
    MethodNotFound {
        /// Name the target reports.
        target: String,
        /// Method requested.
        method: String,
    },

    /// No method was given but the alias resolved to an object.
    #[error("Alias '{alias}' resolved to an object but no method was given")]
    NotCallable {
        /// Alias looked up.
        alias: String,
    },

    /// A method was given but the alias resolved to a callable.
    #[error("Alias '{alias}' resolved to a callable but method '{method}' was requested")]
    NotAnObject {
        /// Alias looked up.
        alias: String,
        /// Method requested.
        method: String,
    },

    /// A listener reported its own failure.
    #[error("Listener failed: {message}")]
    ListenerFailed {
        /// Message from the listener.
        message: String,
    },
}

/// Top-level error type for eventry.
#[derive(Debug, Error)]
pub enum EventError {
    /// Bad input or configuration.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Failure while resolving or running a listener.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Poisoned lock or other broken internal state.
    #[error("Internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl EventError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates the error a listener returns to report its own failure.
    #[must_use]
    pub fn listener_failed(message: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::ListenerFailed {
            message: message.into(),
        })
    }

    /// Creates an invalid listener target error.
    #[must_use]
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::Validation(ValidationError::InvalidListenerTarget {
            reason: reason.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if this error rejects a listener target.
    #[must_use]
    pub const fn is_invalid_target(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::InvalidListenerTarget { .. })
        )
    }

    /// Returns true if this error comes from an unparseable rule pattern.
    #[must_use]
    pub const fn is_malformed_rule(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::MalformedRulePattern { .. })
        )
    }
}

/// Result type alias for eventry operations.
pub type EventResult<T> = Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_listener_target_message() {
        let err = ValidationError::InvalidListenerTarget {
            reason: "expected a selector".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Invalid listener target"));
        assert!(msg.contains("expected a selector"));
    }

    #[test]
    fn test_malformed_rule_pattern_message() {
        let err = ValidationError::MalformedRulePattern {
            rule: "env".to_string(),
            pattern: "(".to_string(),
            reason: "unclosed group".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("env"));
        assert!(msg.contains("unclosed group"));
    }

    #[test]
    fn test_method_not_found_message() {
        let err = ExecutionError::MethodNotFound {
            target: "UserMailer".to_string(),
            method: "on_save".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("UserMailer"));
        assert!(msg.contains("on_save"));
    }

    #[test]
    fn test_event_error_from_validation() {
        let err: EventError = ValidationError::EmptyEventName.into();
        assert!(err.is_validation());
        assert!(!err.is_execution());
    }

    #[test]
    fn test_event_error_from_execution() {
        let err: EventError = ExecutionError::UnresolvableAlias {
            alias: "missing".to_string(),
        }
        .into();
        assert!(err.is_execution());
        assert!(format!("{err}").contains("missing"));
    }

    #[test]
    fn test_classification_helpers() {
        assert!(EventError::invalid_target("nope").is_invalid_target());
        assert!(EventError::internal("poisoned").is_internal());
        assert!(EventError::listener_failed("boom").is_execution());

        let malformed: EventError = ValidationError::MalformedRulePattern {
            rule: "r".to_string(),
            pattern: "[".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert!(malformed.is_malformed_rule());
        assert!(!malformed.is_invalid_target());
    }
}
