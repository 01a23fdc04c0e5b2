//! Minimal statement builder.
//!
//! Produces the statement trees the compiler consumes. Builders are plain
//! values: cloning one clones the tree, and compiling never mutates it, so
//! the same builder can be compiled repeatedly (and against different
//! dialects) with identical output.

use crate::compiler::{self, CompiledQuery, Method};
use crate::dialect::Dialect;
use crate::error::FormatResult;
use crate::expr::Expr;
use std::sync::Arc;

/// A single `column op value` predicate. The operator is itself an
/// expression so raw operators pass through the validator untouched.
#[derive(Debug, Clone)]
pub(crate) struct WhereClause {
    pub(crate) column: Expr,
    pub(crate) operator: Expr,
    pub(crate) value: Expr,
}

/// One `order by` entry.
#[derive(Debug, Clone)]
pub(crate) struct OrderClause {
    pub(crate) column: Expr,
    pub(crate) direction: Expr,
}

/// A dialect-neutral statement description.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    pub(crate) method: Method,
    pub(crate) table: Option<Expr>,
    pub(crate) columns: Vec<Expr>,
    pub(crate) wheres: Vec<WhereClause>,
    pub(crate) orders: Vec<OrderClause>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) assignments: Vec<(String, Expr)>,
    pub(crate) returning: Vec<Expr>,
    pub(crate) alias: Option<String>,
    pub(crate) context: Option<Arc<serde_json::Value>>,
}

impl QueryBuilder {
    /// Create an empty SELECT builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SELECT builder for the given table.
    pub fn select(table: impl Into<Expr>) -> Self {
        Self::new().from(table)
    }

    /// Create an INSERT builder for the given table.
    pub fn insert(table: impl Into<Expr>) -> Self {
        Self {
            method: Method::Insert,
            ..Self::new().from(table)
        }
    }

    /// Create an UPDATE builder for the given table.
    pub fn update(table: impl Into<Expr>) -> Self {
        Self {
            method: Method::Update,
            ..Self::new().from(table)
        }
    }

    /// Create a DELETE builder for the given table.
    pub fn delete(table: impl Into<Expr>) -> Self {
        Self {
            method: Method::Delete,
            ..Self::new().from(table)
        }
    }

    /// Set the target table (or FROM expression).
    pub fn from(mut self, table: impl Into<Expr>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Append one select column.
    pub fn column(mut self, column: impl Into<Expr>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Append several select columns.
    pub fn columns(mut self, columns: impl IntoIterator<Item = impl Into<Expr>>) -> Self {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a `column op value` predicate, ANDed with the others.
    pub fn and_where(
        mut self,
        column: impl Into<Expr>,
        operator: impl Into<Expr>,
        value: impl Into<Expr>,
    ) -> Self {
        self.wheres.push(WhereClause {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    /// Append an equality predicate.
    pub fn where_eq(self, column: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        self.and_where(column, "=", value)
    }

    /// Append an `order by` entry.
    pub fn order_by(mut self, column: impl Into<Expr>, direction: impl Into<Expr>) -> Self {
        self.orders.push(OrderClause {
            column: column.into(),
            direction: direction.into(),
        });
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Switch to first-row semantics (`limit 1` unless a limit is set).
    pub fn first(mut self) -> Self {
        self.method = Method::First;
        self
    }

    /// Add one `column = value` assignment (INSERT values / UPDATE set).
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    /// Append a RETURNING column.
    pub fn returning(mut self, column: impl Into<Expr>) -> Self {
        self.returning.push(column.into());
        self
    }

    /// Alias this statement when used as a sub-statement.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Attach a query context shared with raw fragments compiled under this
    /// statement.
    pub fn query_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    /// The statement kind this builder compiles to.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Compile against a dialect, producing SQL text and ordered bindings.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> FormatResult<CompiledQuery> {
        compiler::compile(self, dialect)
    }
}
