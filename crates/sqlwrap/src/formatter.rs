//! The expression/value compiler.
//!
//! [`Formatter`] resolves any [`Expr`] into a SQL fragment, appending bound
//! scalars and nested-statement bindings to its sink in traversal order. One
//! formatter instance serves exactly one top-level compile; nested statements
//! and callbacks recurse through the same instance so placeholder order and
//! binding order never drift apart.

use crate::builder::QueryBuilder;
use crate::compiler::{self, QueryFragment};
use crate::dialect::Dialect;
use crate::error::{FormatError, FormatResult};
use crate::expr::{BuilderFn, Expr};
use crate::operator;
use crate::value::{Bindings, Value};
use std::sync::Arc;

/// Recursion ceiling for nested statements and callbacks.
pub(crate) const MAX_DEPTH: usize = 64;

/// Placeholder token. Dialect hooks may rewrite bound values but never the
/// placeholder syntax.
const PLACEHOLDER: &str = "?";

/// Compiler state for one top-level statement.
pub struct Formatter<'a> {
    dialect: &'a dyn Dialect,
    bindings: Bindings,
    query_context: Option<Arc<serde_json::Value>>,
    depth: usize,
}

impl<'a> Formatter<'a> {
    /// Create a formatter with a fresh, empty sink.
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self::with_context(dialect, None)
    }

    /// Create a formatter carrying the enclosing statement's query context.
    pub fn with_context(
        dialect: &'a dyn Dialect,
        query_context: Option<Arc<serde_json::Value>>,
    ) -> Self {
        Self {
            dialect,
            bindings: Bindings::new(),
            query_context,
            depth: 0,
        }
    }

    /// View the bindings accumulated so far.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Consume the formatter, handing the sink to the caller.
    pub fn into_bindings(self) -> Bindings {
        self.bindings
    }

    /// Resolve any value into a SQL fragment.
    ///
    /// `is_parameter` marks a parameter position: scalars there are bound and
    /// replaced by a placeholder instead of being rendered inline. Numbers in
    /// identifier position are inlined as literal tokens, never bound.
    pub fn wrap(&mut self, value: &Expr, is_parameter: bool) -> FormatResult<String> {
        match value {
            Expr::Raw(_) | Expr::Subquery(_) => Ok(self
                .unwrap_raw(value, is_parameter)?
                .unwrap_or_default()),
            Expr::Callback(f) => {
                let fragment = self.compile_callback(f)?;
                Ok(self.output_query(&fragment, true))
            }
            Expr::AliasMap(entries) => self.parse_object(entries),
            Expr::List(items) => {
                if is_parameter {
                    return Err(FormatError::unsupported("parameter", value.shape()));
                }
                self.columnize(items)
            }
            Expr::Value(v) => {
                if is_parameter {
                    return Ok(self.parameter(v));
                }
                match v {
                    Value::Int(n) => Ok(n.to_string()),
                    Value::Float(f) => Ok(f.to_string()),
                    other => {
                        let text = other.coerce_string().ok_or_else(|| {
                            FormatError::unsupported("identifier", other.describe())
                        })?;
                        Ok(self.wrap_string(&text))
                    }
                }
            }
        }
    }

    /// Compile the two privileged shapes: raw fragments and nested
    /// statements.
    ///
    /// Returns `Some(sql)` with the fragment's bindings already spliced into
    /// the sink. A plain scalar in parameter position is bound through the
    /// dialect hook and its placeholder returned. Any other shape returns
    /// `None`.
    pub fn unwrap_raw(
        &mut self,
        value: &Expr,
        is_parameter: bool,
    ) -> FormatResult<Option<String>> {
        match value {
            Expr::Subquery(builder) => {
                let fragment = self.compile_subquery(builder)?;
                Ok(Some(self.output_query(&fragment, is_parameter)))
            }
            Expr::Raw(raw) => {
                let compiled = raw.compile(self.query_context.as_ref());
                self.bindings.extend(compiled.bindings);
                Ok(Some(compiled.sql))
            }
            Expr::Value(v) if is_parameter => Ok(Some(self.parameter(v))),
            _ => Ok(None),
        }
    }

    /// Validate an operator token against the whitelist.
    ///
    /// Raw and subquery operators pass through unchanged; anything else is
    /// lowercased and looked up. A miss is fatal for the enclosing compile.
    pub fn operator(&mut self, value: &Expr) -> FormatResult<String> {
        if let Some(sql) = self.unwrap_raw(value, false)? {
            return Ok(sql);
        }
        let text = match value {
            Expr::Value(v) => v.coerce_string(),
            _ => None,
        };
        let Some(text) = text else {
            return Err(FormatError::unsupported("operator", value.shape()));
        };
        operator::canonical(&text.to_ascii_lowercase())
            .map(str::to_string)
            .ok_or(FormatError::OperatorNotPermitted(text))
    }

    /// Parse a string that may encode an inline alias and/or a dotted path.
    ///
    /// The first case-insensitive `" as "` occurrence splits identifier from
    /// alias, even inside quoted literals. Otherwise the
    /// string splits on `.`; the first segment of a multi-segment path is
    /// re-parsed recursively, remaining segments are quoted individually.
    pub fn wrap_string(&self, value: &str) -> String {
        // The token is pure ASCII, so ASCII lowercasing keeps byte offsets
        // aligned with the original string.
        let lower = value.to_ascii_lowercase();
        if let Some(idx) = lower.find(" as ") {
            let first = &value[..idx];
            let second = &value[idx + 4..];
            return self
                .dialect
                .alias(&self.wrap_string(first), &self.wrap_identifier(second));
        }
        let segments: Vec<&str> = value.split('.').collect();
        let mut wrapped = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            if i == 0 && segments.len() > 1 {
                wrapped.push(self.wrap_string(segment.trim()));
            } else {
                wrapped.push(self.wrap_identifier(segment));
            }
        }
        wrapped.join(".")
    }

    /// Quote a single identifier segment. `*` bypasses the dialect hook.
    pub fn wrap_identifier(&self, segment: &str) -> String {
        let trimmed = segment.trim();
        if trimmed == "*" {
            return "*".to_string();
        }
        self.dialect.quote_identifier(trimmed)
    }

    /// Expand an alias-name to value mapping into comma-joined aliased
    /// fragments, in insertion order.
    pub fn parse_object(&mut self, entries: &[(String, Expr)]) -> FormatResult<String> {
        let mut parts = Vec::with_capacity(entries.len());
        for (alias, value) in entries {
            match value {
                Expr::Callback(f) => {
                    let mut fragment = self.compile_callback(f)?;
                    // The mapping key wins over any alias the callback set.
                    fragment.alias = Some(alias.clone());
                    parts.push(self.output_query(&fragment, true));
                }
                Expr::Subquery(_) => {
                    let sql = format!("({})", self.wrap(value, false)?);
                    parts.push(self.dialect.alias(&sql, &self.wrap_identifier(alias)));
                }
                other => {
                    let sql = self.wrap(other, false)?;
                    parts.push(self.dialect.alias(&sql, &self.wrap_identifier(alias)));
                }
            }
        }
        Ok(parts.join(", "))
    }

    /// Parenthesize and alias a compiled fragment where required.
    ///
    /// Row-returning fragments are parenthesized when in parameter position
    /// or carrying an alias; other statement kinds are returned exactly as
    /// compiled.
    pub fn output_query(&self, fragment: &QueryFragment, is_parameter: bool) -> String {
        let sql = &fragment.sql;
        if sql.is_empty() {
            return String::new();
        }
        if fragment.method.returns_rows() && (is_parameter || fragment.alias.is_some()) {
            let wrapped = format!("({sql})");
            if let Some(alias) = &fragment.alias {
                return self.dialect.alias(&wrapped, &self.wrap_string(alias));
            }
            return wrapped;
        }
        sql.clone()
    }

    /// Normalize a sort-direction value.
    ///
    /// Raw and subquery directions pass through; anything unrecognized falls
    /// back to ascending rather than aborting compilation.
    pub fn direction(&mut self, value: &Expr) -> FormatResult<String> {
        if let Some(sql) = self.unwrap_raw(value, false)? {
            return Ok(sql);
        }
        let text = match value {
            Expr::Value(v) => v.coerce_string().unwrap_or_default(),
            _ => String::new(),
        };
        let token = if text.eq_ignore_ascii_case("desc") {
            "desc"
        } else {
            "asc"
        };
        Ok(token.to_string())
    }

    /// Bind one scalar through the dialect parameter hook, returning the
    /// placeholder to splice into the SQL text.
    pub fn parameter(&mut self, value: &Value) -> String {
        let bound = self.dialect.format_parameter(value.clone());
        self.bindings.push(bound);
        PLACEHOLDER.to_string()
    }

    /// Wrap a sequence of columns, comma-joined.
    pub fn columnize(&mut self, columns: &[Expr]) -> FormatResult<String> {
        let mut parts = Vec::with_capacity(columns.len());
        for column in columns {
            parts.push(self.wrap(column, false)?);
        }
        Ok(parts.join(", "))
    }

    /// Compile a value that is either a callback or a raw/subquery fragment,
    /// returning the empty string when it is neither.
    pub fn raw_or_fn(&mut self, value: &Expr) -> FormatResult<String> {
        if let Expr::Callback(f) = value {
            let fragment = self.compile_callback(f)?;
            return Ok(self.output_query(&fragment, false));
        }
        Ok(self.unwrap_raw(value, false)?.unwrap_or_default())
    }

    /// Compile a nested statement into this formatter's sink.
    pub(crate) fn compile_subquery(
        &mut self,
        builder: &QueryBuilder,
    ) -> FormatResult<QueryFragment> {
        if self.depth >= MAX_DEPTH {
            return Err(FormatError::DepthExceeded { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let result = compiler::compile_statement(builder, self);
        self.depth -= 1;
        result
    }

    /// Invoke a callback with a fresh nested builder and compile the result.
    pub(crate) fn compile_callback(&mut self, f: &BuilderFn) -> FormatResult<QueryFragment> {
        let builder = f(QueryBuilder::new());
        self.compile_subquery(&builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, SqliteDialect};
    use crate::operator::OPERATORS;

    fn fmt(dialect: &dyn Dialect) -> Formatter<'_> {
        Formatter::new(dialect)
    }

    #[test]
    fn wrap_string_quotes_dotted_path() {
        let d = GenericDialect;
        let f = fmt(&d);
        assert_eq!(f.wrap_string("orders.total"), "\"orders\".\"total\"");
    }

    #[test]
    fn wrap_string_wildcard_segment_unquoted() {
        let d = SqliteDialect;
        let f = fmt(&d);
        assert_eq!(f.wrap_string("table.*"), "`table`.*");
    }

    #[test]
    fn wrap_string_inline_alias() {
        let d = GenericDialect;
        let f = fmt(&d);
        assert_eq!(
            f.wrap_string("orders.total as grand_total"),
            "\"orders\".\"total\" as \"grand_total\""
        );
    }

    #[test]
    fn wrap_string_alias_is_case_insensitive() {
        let d = GenericDialect;
        let f = fmt(&d);
        assert_eq!(f.wrap_string("total AS t"), "\"total\" as \"t\"");
    }

    #[test]
    fn wrap_string_first_as_occurrence_wins() {
        // No special-casing of quoted literals; the first " as " splits,
        // and the remainder becomes the alias segment verbatim.
        let d = GenericDialect;
        let f = fmt(&d);
        assert_eq!(f.wrap_string("a as b as c"), "\"a\" as \"b as c\"");
    }

    #[test]
    fn wrap_string_empty_alias_sides_pass_through() {
        let d = GenericDialect;
        let f = fmt(&d);
        assert_eq!(f.wrap_string(" as t"), "\"\" as \"t\"");
        assert_eq!(f.wrap_string("t as "), "\"t\" as \"\"");
    }

    #[test]
    fn operator_accepts_every_whitelisted_token_any_case() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        for (key, token) in OPERATORS {
            let upper = key.to_ascii_uppercase();
            let got = f.operator(&Expr::from(upper.as_str())).unwrap();
            assert_eq!(&got, token);
        }
        assert!(f.bindings().is_empty());
    }

    #[test]
    fn operator_rejects_unknown_token() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        let err = f.operator(&Expr::from("1 = 1 --")).unwrap_err();
        assert_eq!(
            err,
            FormatError::OperatorNotPermitted("1 = 1 --".to_string())
        );
        assert_eq!(
            err.to_string(),
            "The operator \"1 = 1 --\" is not permitted"
        );
    }

    #[test]
    fn operator_raw_passes_through() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        let got = f.operator(&Expr::raw("@>")).unwrap();
        assert_eq!(got, "@>");
    }

    #[test]
    fn wildcard_operators_render_escaped() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        assert_eq!(f.operator(&Expr::from("?")).unwrap(), "\\?");
        assert_eq!(f.operator(&Expr::from("?|")).unwrap(), "\\?|");
        assert_eq!(f.operator(&Expr::from("?&")).unwrap(), "\\?&");
    }

    #[test]
    fn direction_normalizes_and_falls_back() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        assert_eq!(f.direction(&Expr::from("DESC")).unwrap(), "desc");
        assert_eq!(f.direction(&Expr::from("asc")).unwrap(), "asc");
        assert_eq!(f.direction(&Expr::from("sideways")).unwrap(), "asc");
        assert_eq!(f.direction(&Expr::from("")).unwrap(), "asc");
    }

    #[test]
    fn numbers_inline_in_identifier_position() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        assert_eq!(f.wrap(&Expr::from(3i64), false).unwrap(), "3");
        assert_eq!(f.wrap(&Expr::from(1.5f64), false).unwrap(), "1.5");
        assert!(f.bindings().is_empty());
    }

    #[test]
    fn scalars_bind_in_parameter_position() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        assert_eq!(f.wrap(&Expr::from("alice"), true).unwrap(), "?");
        assert_eq!(f.wrap(&Expr::from(7i64), true).unwrap(), "?");
        assert_eq!(f.bindings().len(), 2);
    }

    #[test]
    fn raw_bindings_splice_in_order() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        f.parameter(&Value::Int(1));
        let sql = f
            .wrap(
                &Expr::Raw(crate::Raw::with_bindings(
                    "coalesce(?, ?)",
                    vec![Value::Int(2), Value::Int(3)],
                )),
                false,
            )
            .unwrap();
        assert_eq!(sql, "coalesce(?, ?)");
        f.parameter(&Value::Int(4));
        let ints: Vec<_> = f
            .bindings()
            .values()
            .iter()
            .map(|b| match b {
                crate::BindValue::Value(Value::Int(n)) => *n,
                other => panic!("unexpected binding {other:?}"),
            })
            .collect();
        assert_eq!(ints, vec![1, 2, 3, 4]);
    }

    #[test]
    fn list_in_parameter_position_is_an_error() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        let err = f
            .wrap(&Expr::list(["a", "b"]), true)
            .unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedValue { .. }));
    }

    #[test]
    fn returning_sentinel_in_identifier_position_is_an_error() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        let err = f
            .wrap(&Expr::Value(Value::Returning("id".into())), false)
            .unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedValue { .. }));
    }

    #[test]
    fn columnize_joins_columns() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        let sql = f
            .columnize(&[Expr::from("id"), Expr::from("users.name")])
            .unwrap();
        assert_eq!(sql, "\"id\", \"users\".\"name\"");
    }

    #[test]
    fn raw_or_fn_returns_empty_on_no_match() {
        let d = GenericDialect;
        let mut f = fmt(&d);
        assert_eq!(f.raw_or_fn(&Expr::from("plain")).unwrap(), "");
        assert_eq!(f.raw_or_fn(&Expr::raw("now()")).unwrap(), "now()");
    }
}
