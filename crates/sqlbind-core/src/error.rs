//! Error types for sqlbind

use thiserror::Error;

/// Errors raised while classifying a value at the bind boundary.
///
/// These are shape errors in the template or its context, never transient
/// failures, so retrying the same render always fails the same way.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindError {
    /// A list or tuple reached `bind` without going through `inclause`.
    #[error(
        "got a sequence for parameter `{param}`; did you forget to apply `|inclause` to it?"
    )]
    MissingInClause { param: String },

    /// A value with no scalar SQL representation reached a binding filter.
    #[error("invalid bind parameter: {0}")]
    InvalidBindParameter(String),
}

/// Core error type for sqlbind operations
#[derive(Error, Debug)]
pub enum SqlBindError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlBindError {
    /// Returns the classification error, if this is one.
    pub fn as_bind_error(&self) -> Option<&BindError> {
        match self {
            SqlBindError::Bind(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for sqlbind operations
pub type Result<T> = std::result::Result<T, SqlBindError>;
