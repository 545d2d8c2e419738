//! # Parameter and Result Values
//!
//! Dynamic value type shared by parameter maps and tabular results.
//!
//! ## Design Decisions
//!
//! - **Store-shaped**: variants mirror what a graph driver accepts as query
//!   parameters and returns as result cells
//! - **Entity-aware**: the `Entity` variant carries a domain-object reference
//!   so the binder can dereference it to its persisted store identity
//! - **Serde-compatible**: parameter maps and results cross a wire in real
//!   drivers, so everything here serializes

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a domain entity passed as a query-method argument.
///
/// Carries the mapped label and the application-level key the store uses to
/// look up a persisted identity. Whether the entity *is* persisted is the
/// session's call, not ours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Mapped node label (e.g. `"Person"`)
    pub label: String,

    /// Application-level key identifying the instance
    pub key: Box<Value>,
}

impl EntityRef {
    /// Create an entity reference from a label and key value
    pub fn new(label: impl Into<String>, key: Value) -> Self {
        EntityRef {
            label: label.into(),
            key: Box::new(key),
        }
    }
}

/// A dynamically typed value: query-method argument, bound parameter, or
/// result cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// Keyed composite (row objects, projected rows)
    Map(BTreeMap<String, Value>),
    /// Domain entity passed directly as an argument; candidates for
    /// identity dereferencing during binding
    Entity(EntityRef),
}

impl Value {
    /// Construct an entity-reference value
    pub fn entity(label: impl Into<String>, key: Value) -> Self {
        Value::Entity(EntityRef::new(label, key))
    }

    /// Extract an integer if this value holds one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a string slice if this value holds one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is an entity reference
    pub fn is_entity(&self) -> bool {
        matches!(self, Value::Entity(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Entity(e) => write!(f, "{}({})", e.label, e.key),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
