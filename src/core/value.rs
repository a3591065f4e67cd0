//! Opaque cache values carried by gateway events.
//!
//! Keys, substitute values and callback arguments are application objects;
//! the event only needs to move them, compare them, and size them.

use std::fmt;

use bytes::Bytes;

/// An application object as seen by the replication layer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    String(String),
    Bytes(Bytes),
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}L"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "bytes[{}]", v.len()),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Callback argument attached to a mutation.
///
/// Senders wrap the application's argument (possibly more than once, and
/// possibly around nothing); consumers only ever see the innermost payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallbackArgument {
    Plain(Value),
    Wrapped(Option<Box<CallbackArgument>>),
}

impl CallbackArgument {
    pub fn plain(value: impl Into<Value>) -> Self {
        CallbackArgument::Plain(value.into())
    }

    pub fn wrap(inner: CallbackArgument) -> Self {
        CallbackArgument::Wrapped(Some(Box::new(inner)))
    }

    /// A wrapper around an absent application argument.
    pub fn empty_wrapper() -> Self {
        CallbackArgument::Wrapped(None)
    }

    /// Innermost payload, or `None` if the innermost wrapper holds nothing.
    pub fn unwrapped(&self) -> Option<&Value> {
        match self {
            CallbackArgument::Plain(value) => Some(value),
            CallbackArgument::Wrapped(Some(inner)) => inner.unwrapped(),
            CallbackArgument::Wrapped(None) => None,
        }
    }

    /// Number of wrapper layers around the payload.
    pub fn depth(&self) -> usize {
        match self {
            CallbackArgument::Plain(_) | CallbackArgument::Wrapped(None) => 0,
            CallbackArgument::Wrapped(Some(inner)) => 1 + inner.depth(),
        }
    }
}

impl fmt::Display for CallbackArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackArgument::Plain(value) => write!(f, "{value}"),
            CallbackArgument::Wrapped(Some(inner)) => write!(f, "Wrapped({inner})"),
            CallbackArgument::Wrapped(None) => f.write_str("Wrapped(null)"),
        }
    }
}

/// Value enqueued in place of the mutation's own new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubstituteValue {
    /// Already-encoded bytes, shipped as-is and flagged as not an object.
    Bytes(Bytes),
    /// An explicit null.
    Null,
    /// An object that still needs serializing.
    Object(Value),
}
