//! sqlwrap: dialect-neutral SQL compilation.
//!
//! The crate turns statement trees into SQL text plus an ordered list of
//! bound values, with dialect differences (identifier quoting, aliasing,
//! bind-value coercion) isolated behind the [`Dialect`] trait. The core is
//! the [`Formatter`], which resolves any value shape (scalar, raw fragment,
//! nested statement, callback, alias map, column list) into a SQL fragment
//! while appending bindings to a single sink in traversal order.
//!
//! ```
//! use sqlwrap::{GenericDialect, qb};
//!
//! let compiled = qb::select("users")
//!     .column("id")
//!     .and_where("status", "=", "active")
//!     .limit(10)
//!     .to_sql(&GenericDialect)?;
//!
//! assert_eq!(
//!     compiled.sql,
//!     "select \"id\" from \"users\" where \"status\" = ? limit ?"
//! );
//! assert_eq!(compiled.bindings.len(), 2);
//! # Ok::<(), sqlwrap::FormatError>(())
//! ```
//!
//! Placeholder syntax is always `?`. Dialects may rewrite the bound value
//! behind a placeholder but never the placeholder itself; positional
//! renumbering (`$1`, `:1`) belongs to the execution layer.

mod builder;
mod compiler;
mod dialect;
mod error;
mod expr;
mod formatter;
mod operator;
mod value;


pub use builder::QueryBuilder;
pub use compiler::{CompiledQuery, Method, QueryFragment};
pub use dialect::{Dialect, GenericDialect, OracleDialect, SqliteDialect};
pub use error::{FormatError, FormatResult};
pub use expr::{BuilderFn, Expr, Raw};
pub use formatter::Formatter;
pub use value::{BindValue, Bindings, OutParam, Value};

/// Free-function builder constructors.
pub mod qb {
    use crate::builder::QueryBuilder;
    use crate::expr::Expr;

    /// Start a SELECT statement against `table`.
    pub fn select(table: impl Into<Expr>) -> QueryBuilder {
        QueryBuilder::select(table)
    }

    /// Start an INSERT statement against `table`.
    pub fn insert(table: impl Into<Expr>) -> QueryBuilder {
        QueryBuilder::insert(table)
    }

    /// Start an UPDATE statement against `table`.
    pub fn update(table: impl Into<Expr>) -> QueryBuilder {
        QueryBuilder::update(table)
    }

    /// Start a DELETE statement against `table`.
    pub fn delete(table: impl Into<Expr>) -> QueryBuilder {
        QueryBuilder::delete(table)
    }

    /// A raw SQL fragment expression.
    pub fn raw(sql: impl Into<String>) -> Expr {
        Expr::raw(sql)
    }
}
