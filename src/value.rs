//! Argument values passed to listeners.
//!
//! Trigger arguments are positional and dynamically typed: a listener
//! receives `&[Value]` and picks out what it needs. Scalars get their own
//! variants; anything nested travels as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single positional argument handed to a listener.
///
/// Serializes as plain JSON, so `Value::Int(3)` is `3` and
/// `Value::String("ada")` is `"ada"`.
///
/// # Examples
///
/// ```
/// use eventry::Value;
///
/// let args = [Value::from("ada"), Value::from(42)];
/// assert_eq!(args[0].as_str(), Some("ada"));
/// assert_eq!(args[1].as_i64(), Some(42));
/// assert_eq!(args[0].to_string(), "ada");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text; also the only form accepted as a listener selector.
    String(String),
    /// Arrays and objects.
    Structured(serde_json::Value),
}

impl Value {
    /// Builds a value from JSON, keeping scalars in their own variants.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Structured(serde_json::Value::Number(n))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            nested => Self::Structured(nested),
        }
    }

    /// Text content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Nested JSON content.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Structured(_) => "structured",
        }
    }
}

// Renders the way a listener would write the value into output: strings
// unquoted, nested values as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::from_json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_writes_strings_plainly() {
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(false).to_string(), "false");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(json!([1, "a"])).to_string(), r#"[1,"a"]"#);
    }

    #[test]
    fn test_from_json_keeps_scalars_flat() {
        assert_eq!(Value::from(json!(7)), Value::Int(7));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from(json!("x")), Value::String("x".to_string()));
        assert_eq!(Value::from(json!(null)), Value::Null);

        let nested = Value::from(json!({"user": "ada"}));
        assert_eq!(nested.type_name(), "structured");
        assert_eq!(nested.as_json().and_then(|j| j["user"].as_str()), Some("ada"));
    }

    #[test]
    fn test_accessors_reject_other_variants() {
        let v = Value::from(3);
        assert_eq!(v.as_i64(), Some(3));
        assert!(v.as_str().is_none());
        assert!(Value::from("3").as_i64().is_none());
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some("ada")).as_str(), Some("ada"));
    }

    #[test]
    fn test_args_deserialize_from_plain_json() {
        let args: Vec<Value> = serde_json::from_str(r#"["ada", 3, 2.5, true, null, {"k": 1}]"#).unwrap();
        assert_eq!(
            args,
            vec![
                Value::from("ada"),
                Value::Int(3),
                Value::Float(2.5),
                Value::Bool(true),
                Value::Null,
                Value::Structured(json!({"k": 1})),
            ]
        );
        assert_eq!(serde_json::to_string(&args[0]).unwrap(), r#""ada""#);
    }
}
