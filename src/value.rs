//! The scalar value union a leaf [`crate::node::Node`] can hold.
//!
//! The source language's implicit scalar union is re-expressed here as a
//! closed, exhaustive variant: there is no "other" arm, so the compiler
//! enforces the "type inference is exhaustive" design note rather than us
//! hand-maintaining a catch-all.

use crate::error::Error;

/// A leaf's scalar payload. `Node::value` is `Option<Value>`; `None` is the
/// "absent" value kind from the data model (an interior node, or a freshly
/// created node with no value yet) — there is deliberately no `Value::Null`
/// arm, since the type-inference rules in the component design never accept
/// one (see DESIGN.md).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// The wire/string label of a [`Value`]'s runtime kind, as used by
/// `to_dict`/snapshot/WAL consumers that want a human-readable tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    Str,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Bool => "BOOL",
            TypeTag::Int => "INT",
            TypeTag::Float => "FLOAT",
            TypeTag::Str => "STR",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Infer this value's [`TypeTag`]. Exhaustive by construction: every
    /// `Value` arm has exactly one corresponding tag.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Value> for serde_json::Value {
    /// `Value::Float(f)` only reaches here as a finite `f64` — `Tree::set`
    /// rejects NaN/infinite floats before a `Value` is ever logged or
    /// stored (JSON has no literal for them, so letting one through would
    /// silently degrade to `null` on the very next WAL/snapshot round-trip).
    /// The fallback below is defensive for callers constructing a `Value`
    /// directly rather than through `Tree::set`.
    fn from(v: Value) -> Self {
        match v {
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s),
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    /// Reject anything that isn't one of the four supported scalar kinds —
    /// `null` and arrays/objects in particular — with `invalid-format`,
    /// matching the stricter of the two behaviors the source exhibited
    /// (spec.md §9, "Open questions").
    fn try_from(json: serde_json::Value) -> Result<Self, Error> {
        match json {
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(Error::InvalidFormat {
                        reason: format!("unsupported number literal: {n}"),
                    })
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s)),
            serde_json::Value::Null => Err(Error::InvalidFormat {
                reason: "null is not a settable scalar value".to_string(),
            }),
            serde_json::Value::Array(_) => Err(Error::InvalidFormat {
                reason: "arrays are not a supported scalar value".to_string(),
            }),
            serde_json::Value::Object(_) => unreachable!(
                "objects are routed to Node::from_json's interior-node branch"
            ),
        }
    }
}
