//! Dialect hooks.
//!
//! The only points where dialect identity enters the compiler: identifier
//! quoting, alias rendering, and parameter coercion. Hooks are read-only
//! strategy objects injected per compile.

mod generic;
mod oracle;
mod sqlite;

pub use generic::GenericDialect;
pub use oracle::OracleDialect;
pub use sqlite::SqliteDialect;

use crate::value::{BindValue, Value};

/// Capability set required from the host client.
pub trait Dialect {
    /// Quote and escape a single identifier segment.
    ///
    /// The `*` segment never reaches this hook; the formatter passes it
    /// through unquoted.
    fn quote_identifier(&self, segment: &str) -> String;

    /// Render an aliased fragment.
    fn alias(&self, sql: &str, alias: &str) -> String {
        format!("{sql} as {alias}")
    }

    /// Coerce a scalar into its bound representation.
    ///
    /// Never changes placeholder syntax, only the value pushed to the sink.
    fn format_parameter(&self, value: Value) -> BindValue {
        BindValue::Value(value)
    }
}

/// Quote a segment by wrapping it in `quote` and doubling embedded quotes.
pub(crate) fn quote_doubling(segment: &str, quote: char) -> String {
    let mut out = String::with_capacity(segment.len() + 2);
    out.push(quote);
    for ch in segment.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
    out
}
