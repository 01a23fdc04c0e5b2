//! The expression value union the compiler dispatches over.
//!
//! Every value position in a statement tree holds an [`Expr`]. The set of
//! variants is closed: dispatch in the formatter is an exhaustive match, with
//! the scalar arm reproducing the string-coercion fallback for identifiers.

use crate::builder::QueryBuilder;
use crate::compiler::{CompiledQuery, Method};
use crate::value::{Bindings, Value};
use std::sync::Arc;

/// A caller-supplied function that configures a fresh nested statement
/// builder. Invoked synchronously during compilation.
pub type BuilderFn = Arc<dyn Fn(QueryBuilder) -> QueryBuilder + Send + Sync>;

/// A value the compiler may encounter in any value position.
#[derive(Clone)]
pub enum Expr {
    /// Plain scalar; strings double as identifiers in identifier position.
    Value(Value),
    /// Pre-built SQL fragment with its own bindings.
    Raw(Raw),
    /// Nested statement, compiled into the enclosing sink.
    Subquery(Box<QueryBuilder>),
    /// Callback that builds a sub-statement against a fresh builder.
    Callback(BuilderFn),
    /// Ordered alias-name to value mapping, expanded comma-joined.
    AliasMap(Vec<(String, Expr)>),
    /// Multiple columns when in identifier position.
    List(Vec<Expr>),
}

impl Expr {
    /// Create a raw SQL fragment expression without bindings.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(Raw::new(sql))
    }

    /// Create a nested-statement expression.
    pub fn subquery(builder: QueryBuilder) -> Self {
        Expr::Subquery(Box::new(builder))
    }

    /// Create a callback expression.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(QueryBuilder) -> QueryBuilder + Send + Sync + 'static,
    {
        Expr::Callback(Arc::new(f))
    }

    /// Create an alias-map expression. Iteration order is insertion order.
    pub fn alias_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Expr>,
    {
        Expr::AliasMap(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Create a multi-column list expression.
    pub fn list(items: impl IntoIterator<Item = impl Into<Expr>>) -> Self {
        Expr::List(items.into_iter().map(Into::into).collect())
    }

    /// Short shape name used in error messages.
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Expr::Value(_) => "value",
            Expr::Raw(_) => "raw",
            Expr::Subquery(_) => "subquery",
            Expr::Callback(_) => "callback",
            Expr::AliasMap(_) => "alias map",
            Expr::List(_) => "list",
        }
    }
}

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Expr::Raw(r) => f.debug_tuple("Raw").field(r).finish(),
            Expr::Subquery(q) => f.debug_tuple("Subquery").field(q).finish(),
            Expr::Callback(_) => f.debug_tuple("Callback").field(&"<fn>").finish(),
            Expr::AliasMap(m) => f.debug_tuple("AliasMap").field(m).finish(),
            Expr::List(l) => f.debug_tuple("List").field(l).finish(),
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Value(Value::Text(s.to_string()))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Value(Value::Text(s))
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Value(Value::Int(n))
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Value(Value::Int(n.into()))
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        Expr::Value(Value::Float(f))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Value(Value::Bool(b))
    }
}

impl From<Raw> for Expr {
    fn from(raw: Raw) -> Self {
        Expr::Raw(raw)
    }
}

impl From<QueryBuilder> for Expr {
    fn from(builder: QueryBuilder) -> Self {
        Expr::Subquery(Box::new(builder))
    }
}

/// A caller-supplied, pre-built literal SQL snippet.
///
/// Opaque to the compiler except for its own embedded bindings and an
/// optional shared query context resolved lazily from the enclosing
/// statement when the fragment carries none of its own.
#[derive(Debug, Clone)]
pub struct Raw {
    pub(crate) sql: String,
    pub(crate) bindings: Vec<Value>,
    pub(crate) context: Option<Arc<serde_json::Value>>,
}

impl Raw {
    /// Create a raw fragment without bindings.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
            context: None,
        }
    }

    /// Create a raw fragment with embedded bindings.
    pub fn with_bindings(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
            context: None,
        }
    }

    /// Append one embedded binding.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.bindings.push(value.into());
        self
    }

    /// Attach a query context owned by this fragment.
    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    /// The fragment's SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Compile the fragment standalone.
    ///
    /// `fallback_context` is the enclosing statement's context; the fragment's
    /// own context wins when present. The context is shared, not copied.
    pub fn compile(&self, fallback_context: Option<&Arc<serde_json::Value>>) -> CompiledQuery {
        CompiledQuery {
            sql: self.sql.clone(),
            bindings: Bindings::from(self.bindings.clone()),
            method: Method::Raw,
            alias: None,
            context: self.context.clone().or_else(|| fallback_context.cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_own_context_wins() {
        let enclosing = Arc::new(serde_json::json!({"tenant": "a"}));
        let own = serde_json::json!({"tenant": "b"});
        let raw = Raw::new("now()").context(own.clone());
        let compiled = raw.compile(Some(&enclosing));
        assert_eq!(compiled.context.as_deref(), Some(&own));
    }

    #[test]
    fn raw_inherits_enclosing_context() {
        let enclosing = Arc::new(serde_json::json!({"tenant": "a"}));
        let compiled = Raw::new("now()").compile(Some(&enclosing));
        // Pass-through shares the same allocation.
        assert!(Arc::ptr_eq(compiled.context.as_ref().unwrap(), &enclosing));
    }

    #[test]
    fn raw_bind_appends_in_order() {
        let raw = Raw::new("between ? and ?").bind(1i64).bind(10i64);
        let compiled = raw.compile(None);
        assert_eq!(
            compiled.bindings,
            crate::Bindings::from(vec![Value::Int(1), Value::Int(10)])
        );
    }

    #[test]
    fn expr_from_conversions() {
        assert!(matches!(Expr::from(7i64), Expr::Value(Value::Int(7))));
        assert!(matches!(Expr::from("users.id"), Expr::Value(Value::Text(_))));
        assert!(matches!(Expr::from(Raw::new("1")), Expr::Raw(_)));
    }
}
