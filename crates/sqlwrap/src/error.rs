//! Error types for sqlwrap

use thiserror::Error;

/// Result type alias for compile operations
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while compiling an expression tree.
///
/// None of these are retryable: they indicate a malformed statement tree,
/// not a transient condition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormatError {
    /// Operator string absent from the whitelist
    #[error("The operator \"{0}\" is not permitted")]
    OperatorNotPermitted(String),

    /// A value shape the compiler refuses to stringify
    #[error("Cannot compile value in {context} position: {value}")]
    UnsupportedValue {
        context: &'static str,
        value: String,
    },

    /// Statement nesting exceeded the recursion ceiling
    #[error("Statement nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
}

impl FormatError {
    /// Create an unsupported-value error carrying the offending input.
    pub fn unsupported(context: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            context,
            value: value.into(),
        }
    }

    /// Check if this is an operator rejection
    pub fn is_operator_rejection(&self) -> bool {
        matches!(self, Self::OperatorNotPermitted(_))
    }
}
