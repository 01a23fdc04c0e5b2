//! Statement compilation.
//!
//! Turns a [`QueryBuilder`] tree into SQL text plus ordered bindings. The
//! top-level [`compile`] owns the formatter (and with it the binding sink);
//! nested statements go through [`compile_statement`] with the enclosing
//! formatter so bindings land in one sink, in traversal order.

use crate::builder::QueryBuilder;
use crate::dialect::Dialect;
use crate::error::{FormatError, FormatResult};
use crate::expr::Expr;
use crate::formatter::Formatter;
use crate::value::Bindings;
use serde::Serialize;
use std::sync::Arc;

/// Statement kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Method {
    #[default]
    Select,
    First,
    Insert,
    Update,
    Delete,
    Raw,
}

impl Method {
    /// Whether this kind produces a row set; only these fragments are ever
    /// parenthesized by the output normalizer.
    pub fn returns_rows(self) -> bool {
        matches!(self, Method::Select | Method::First)
    }
}

/// A compiled nested statement, before parenthesization/aliasing decisions.
#[derive(Debug, Clone)]
pub struct QueryFragment {
    pub sql: String,
    pub alias: Option<String>,
    pub method: Method,
}

/// Output of one top-level compile: SQL text with exactly one placeholder
/// per entry in `bindings`, in matching left-to-right order.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Bindings,
    pub method: Method,
    pub alias: Option<String>,
    /// Shared execution context, resolved lazily by raw fragments.
    pub context: Option<Arc<serde_json::Value>>,
}

/// Compile a top-level statement against a dialect.
pub fn compile(builder: &QueryBuilder, dialect: &dyn Dialect) -> FormatResult<CompiledQuery> {
    let mut fmt = Formatter::with_context(dialect, builder.context.clone());
    let fragment = compile_statement(builder, &mut fmt)?;
    let bindings = fmt.into_bindings();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "sqlwrap.sql",
        method = ?fragment.method,
        sql = %fragment.sql,
        binding_count = bindings.len(),
        "compiled statement"
    );

    Ok(CompiledQuery {
        sql: fragment.sql,
        bindings,
        method: fragment.method,
        alias: fragment.alias,
        context: builder.context.clone(),
    })
}

/// Compile a statement into an existing formatter's sink.
pub(crate) fn compile_statement(
    builder: &QueryBuilder,
    fmt: &mut Formatter<'_>,
) -> FormatResult<QueryFragment> {
    let sql = match builder.method {
        Method::Select | Method::First => compile_select(builder, fmt)?,
        Method::Insert => compile_insert(builder, fmt)?,
        Method::Update => compile_update(builder, fmt)?,
        Method::Delete => compile_delete(builder, fmt)?,
        // Raw statements compile through `Raw::compile`, never a builder.
        Method::Raw => {
            return Err(FormatError::unsupported("statement", "raw builder"));
        }
    };
    Ok(QueryFragment {
        sql,
        alias: builder.alias.clone(),
        method: builder.method,
    })
}

fn compile_select(builder: &QueryBuilder, fmt: &mut Formatter<'_>) -> FormatResult<String> {
    let mut sql = String::from("select ");
    if builder.columns.is_empty() {
        sql.push('*');
    } else {
        sql.push_str(&fmt.columnize(&builder.columns)?);
    }

    if let Some(table) = &builder.table {
        sql.push_str(" from ");
        sql.push_str(&fmt.wrap(table, false)?);
    }

    push_wheres(&mut sql, builder, fmt)?;

    if !builder.orders.is_empty() {
        sql.push_str(" order by ");
        let mut parts = Vec::with_capacity(builder.orders.len());
        for order in &builder.orders {
            let column = fmt.wrap(&order.column, false)?;
            let direction = fmt.direction(&order.direction)?;
            parts.push(format!("{column} {direction}"));
        }
        sql.push_str(&parts.join(", "));
    }

    // `first` reads one row; limit and offset bind as ordinary parameters.
    let limit = match (builder.method, builder.limit) {
        (Method::First, None) => Some(1),
        (_, limit) => limit,
    };
    if let Some(n) = limit {
        sql.push_str(" limit ");
        sql.push_str(&fmt.wrap(&Expr::from(n), true)?);
    }
    if let Some(n) = builder.offset {
        sql.push_str(" offset ");
        sql.push_str(&fmt.wrap(&Expr::from(n), true)?);
    }

    Ok(sql)
}

fn compile_insert(builder: &QueryBuilder, fmt: &mut Formatter<'_>) -> FormatResult<String> {
    let table = required_table(builder, "insert")?;
    let mut sql = String::from("insert into ");
    sql.push_str(&fmt.wrap(table, false)?);

    if !builder.assignments.is_empty() {
        let columns: Vec<String> = builder
            .assignments
            .iter()
            .map(|(column, _)| fmt.wrap_string(column))
            .collect();
        sql.push_str(" (");
        sql.push_str(&columns.join(", "));
        sql.push_str(") values (");
        let mut values = Vec::with_capacity(builder.assignments.len());
        for (_, value) in &builder.assignments {
            values.push(fmt.wrap(value, true)?);
        }
        sql.push_str(&values.join(", "));
        sql.push(')');
    }

    push_returning(&mut sql, builder, fmt)?;
    Ok(sql)
}

fn compile_update(builder: &QueryBuilder, fmt: &mut Formatter<'_>) -> FormatResult<String> {
    let table = required_table(builder, "update")?;
    let mut sql = String::from("update ");
    sql.push_str(&fmt.wrap(table, false)?);

    sql.push_str(" set ");
    let mut sets = Vec::with_capacity(builder.assignments.len());
    for (column, value) in &builder.assignments {
        let column = fmt.wrap_string(column);
        let value = fmt.wrap(value, true)?;
        sets.push(format!("{column} = {value}"));
    }
    sql.push_str(&sets.join(", "));

    push_wheres(&mut sql, builder, fmt)?;
    push_returning(&mut sql, builder, fmt)?;
    Ok(sql)
}

fn compile_delete(builder: &QueryBuilder, fmt: &mut Formatter<'_>) -> FormatResult<String> {
    let table = required_table(builder, "delete")?;
    let mut sql = String::from("delete from ");
    sql.push_str(&fmt.wrap(table, false)?);
    push_wheres(&mut sql, builder, fmt)?;
    push_returning(&mut sql, builder, fmt)?;
    Ok(sql)
}

fn required_table<'b>(builder: &'b QueryBuilder, kind: &'static str) -> FormatResult<&'b Expr> {
    builder
        .table
        .as_ref()
        .ok_or_else(|| FormatError::unsupported(kind, "statement without a table"))
}

fn push_wheres(
    sql: &mut String,
    builder: &QueryBuilder,
    fmt: &mut Formatter<'_>,
) -> FormatResult<()> {
    if builder.wheres.is_empty() {
        return Ok(());
    }
    sql.push_str(" where ");
    for (i, clause) in builder.wheres.iter().enumerate() {
        if i > 0 {
            sql.push_str(" and ");
        }
        // Left-to-right so bindings land in placeholder order.
        let column = fmt.wrap(&clause.column, false)?;
        let operator = fmt.operator(&clause.operator)?;
        let value = fmt.wrap(&clause.value, true)?;
        sql.push_str(&column);
        sql.push(' ');
        sql.push_str(&operator);
        sql.push(' ');
        sql.push_str(&value);
    }
    Ok(())
}

fn push_returning(
    sql: &mut String,
    builder: &QueryBuilder,
    fmt: &mut Formatter<'_>,
) -> FormatResult<()> {
    if builder.returning.is_empty() {
        return Ok(());
    }
    sql.push_str(" returning ");
    sql.push_str(&fmt.columnize(&builder.returning)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDialect;

    #[test]
    fn select_star_by_default() {
        let compiled = QueryBuilder::select("users")
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(compiled.sql, "select * from \"users\"");
        assert!(compiled.bindings.is_empty());
        assert_eq!(compiled.method, Method::Select);
    }

    #[test]
    fn select_with_where_binds_value() {
        let compiled = QueryBuilder::select("users")
            .column("id")
            .and_where("status", "=", "active")
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "select \"id\" from \"users\" where \"status\" = ?"
        );
        assert_eq!(compiled.bindings.len(), 1);
    }

    #[test]
    fn first_forces_limit_one() {
        let compiled = QueryBuilder::select("users")
            .first()
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(compiled.sql, "select * from \"users\" limit ?");
        assert_eq!(compiled.bindings.len(), 1);
        assert_eq!(compiled.method, Method::First);
    }

    #[test]
    fn limit_and_offset_bind_as_parameters() {
        let compiled = QueryBuilder::select("users")
            .limit(10)
            .offset(20)
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(compiled.sql, "select * from \"users\" limit ? offset ?");
        assert_eq!(compiled.bindings.len(), 2);
    }

    #[test]
    fn insert_with_returning() {
        let compiled = QueryBuilder::insert("users")
            .set("username", "alice")
            .set("age", 30i64)
            .returning("id")
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "insert into \"users\" (\"username\", \"age\") values (?, ?) returning \"id\""
        );
        assert_eq!(compiled.bindings.len(), 2);
    }

    #[test]
    fn update_set_then_where_binding_order() {
        let compiled = QueryBuilder::update("users")
            .set("status", "inactive")
            .and_where("id", "=", 7i64)
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "update \"users\" set \"status\" = ? where \"id\" = ?"
        );
        assert_eq!(compiled.bindings.len(), 2);
    }

    #[test]
    fn delete_compiles() {
        let compiled = QueryBuilder::delete("users")
            .and_where("id", "=", 7i64)
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(compiled.sql, "delete from \"users\" where \"id\" = ?");
    }

    #[test]
    fn order_by_normalizes_direction() {
        let compiled = QueryBuilder::select("users")
            .order_by("created_at", "DESC")
            .order_by("id", "sideways")
            .to_sql(&GenericDialect)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "select * from \"users\" order by \"created_at\" desc, \"id\" asc"
        );
    }

    #[test]
    fn mutation_without_table_is_an_error() {
        let tableless_select = QueryBuilder::new().set("a", 1i64).to_sql(&GenericDialect);
        assert!(tableless_select.is_ok(), "select without table is fine");
        let err = QueryBuilder {
            method: Method::Insert,
            ..QueryBuilder::new()
        }
        .to_sql(&GenericDialect)
        .unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedValue { .. }));
    }
}
