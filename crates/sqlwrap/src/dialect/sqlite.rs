use super::{Dialect, quote_doubling};

/// SQLite dialect: backtick-quoted identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn quote_identifier(&self, segment: &str) -> String {
        quote_doubling(segment, '`')
    }
}
