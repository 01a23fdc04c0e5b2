use super::{Dialect, quote_doubling};

/// Standard-SQL dialect: double-quoted identifiers, no parameter coercion.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn quote_identifier(&self, segment: &str) -> String {
        quote_doubling(segment, '"')
    }
}
