//! Error types for the typed-CSV codec.

use thiserror::Error;

/// Errors raised while parsing headers, resolving functions or
/// converting cell values.
#[derive(Debug, Error)]
pub enum Error {
    /// A header cell does not match `NAME[:TYPE][=CONVERT_SPEC]`.
    #[error("header field '{0}' cannot be parsed")]
    InvalidHeader(String),

    /// A `:TYPE` token names a function that is not registered.
    #[error("unsupported data type '{0}'")]
    UnknownType(String),

    /// A convert or stringify spec names a function that is not
    /// registered.
    #[error("convert function '{0}' is not defined")]
    UnknownConvert(String),

    /// A registry function rejected a cell value. Readers and writers
    /// suppress this kind when `ignore_value_errors` is set.
    #[error("column '{column}': {source}")]
    Cast {
        column: String,
        #[source]
        source: CastError,
    },

    /// A resolved type function does not match any entry in the
    /// registry asked to stringify it.
    #[error("type function '{0}' is not registered with this writer")]
    TypeFuncNotRegistered(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single conversion or type-cast call.
#[derive(Debug, Clone, PartialEq)]
pub struct CastError {
    pub message: String,
    pub value: String,
    pub expected: String,
}

impl std::fmt::Display for CastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to convert '{}' to {}: {}",
            self.value, self.expected, self.message
        )
    }
}

impl std::error::Error for CastError {}
