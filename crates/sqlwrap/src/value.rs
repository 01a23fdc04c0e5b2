//! Scalar values and the ordered binding sink.
//!
//! A [`Bindings`] sink is owned by exactly one top-level compile and threaded
//! by `&mut` through every nested compile, so the n-th placeholder emitted
//! into the SQL text always corresponds to index n in the sink.

use serde::{Deserialize, Serialize};

/// A scalar value the compiler may encounter in a value position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Sentinel standing in for a RETURNING-style out parameter.
    ///
    /// Carries the column name; dialect parameter hooks may replace it with
    /// an [`OutParam`] descriptor consumed only by the execution layer.
    Returning(String),
}

impl Value {
    /// String form used when a scalar lands in identifier position.
    pub(crate) fn coerce_string(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            // An out-parameter sentinel is not a name.
            Value::Returning(_) => None,
        }
    }

    /// Debug-friendly rendering for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("{s:?}"),
            Value::Returning(col) => format!("returning({col})"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Dialect-specific out-parameter descriptor.
///
/// Produced by a dialect's parameter hook in place of a [`Value::Returning`]
/// sentinel; the compiler treats it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutParam {
    /// Column the out parameter reports back.
    pub column: String,
}

/// A value as it lands in the binding sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BindValue {
    Value(Value),
    OutParam(OutParam),
}

/// Ordered, append-only sequence of bind values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    values: Vec<BindValue>,
}

impl Bindings {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append one bind value.
    pub fn push(&mut self, value: BindValue) {
        self.values.push(value);
    }

    /// Splice another compiled fragment's bindings, in order.
    pub fn extend(&mut self, other: Bindings) {
        self.values.extend(other.values);
    }

    /// Append plain scalar bindings, in order.
    pub fn extend_values(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values.into_iter().map(BindValue::Value));
    }

    /// Number of bindings accumulated so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the sink is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// View the accumulated bindings.
    pub fn values(&self) -> &[BindValue] {
        &self.values
    }

    /// Consume the sink, handing the bindings to the caller.
    pub fn into_vec(self) -> Vec<BindValue> {
        self.values
    }
}

impl From<Vec<Value>> for Bindings {
    fn from(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter().map(BindValue::Value).collect(),
        }
    }
}
