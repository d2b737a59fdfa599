//! Error types for sqlchain

use thiserror::Error;

/// Result type alias for sqlchain operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for query building and execution.
///
/// The first four variants are builder errors: they are returned at the fluent
/// call that detects them, before anything reaches the database. Everything
/// else comes back from the execution engine.
#[derive(Debug, Error)]
pub enum QbError {
    /// A condition was given zero or more than three positional arguments
    #[error("Error number of parameters: expected 1 to 3 condition arguments, got {0}")]
    ArgumentCount(usize),

    /// A condition argument has the wrong shape (e.g. single-argument form without a mapping)
    #[error("Argument type error: {0}")]
    ArgumentType(String),

    /// A comparison operator outside the whitelist
    #[error("Confusing symbol: {0}")]
    InvalidOperator(String),

    /// Builder state cannot produce a statement
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Execution error reported by a non-postgres engine
    #[error("Execution error: {0}")]
    Execution(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if this error was raised while building, not while executing
    pub fn is_builder_error(&self) -> bool {
        matches!(
            self,
            Self::ArgumentCount(_)
                | Self::ArgumentType(_)
                | Self::InvalidOperator(_)
                | Self::Validation(_)
        )
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Parse a tokio_postgres error into a more specific QbError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for QbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_errors_are_classified() {
        assert!(QbError::ArgumentCount(4).is_builder_error());
        assert!(QbError::InvalidOperator("LIKE".into()).is_builder_error());
        assert!(QbError::validation("no table").is_builder_error());
        assert!(!QbError::execution("syntax error").is_builder_error());
        assert!(!QbError::not_found("row").is_builder_error());
    }

    #[test]
    fn argument_count_message() {
        let err = QbError::ArgumentCount(0);
        assert_eq!(
            err.to_string(),
            "Error number of parameters: expected 1 to 3 condition arguments, got 0"
        );
    }
}
