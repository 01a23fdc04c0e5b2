use super::{Dialect, quote_doubling};
use crate::value::{BindValue, OutParam, Value};

/// Oracle-style dialect.
///
/// Oracle has no native boolean bind type, so booleans bind as integer 0/1,
/// and the returning sentinel becomes an out-parameter descriptor consumed
/// by the execution layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn quote_identifier(&self, segment: &str) -> String {
        quote_doubling(segment, '"')
    }

    fn format_parameter(&self, value: Value) -> BindValue {
        match value {
            Value::Bool(b) => BindValue::Value(Value::Int(i64::from(b))),
            Value::Returning(column) => BindValue::OutParam(OutParam { column }),
            other => BindValue::Value(other),
        }
    }
}
