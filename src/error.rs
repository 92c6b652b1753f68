//! Error type for the reading and writing engines.

use thiserror::Error;

/// Errors surfaced while reading or writing typed-CSV data.
#[derive(Debug, Error)]
pub enum Error {
    /// Header, registry or value-conversion failure.
    #[error(transparent)]
    Codec(#[from] tcsv_core::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tokenizer could not split or join a physical line.
    #[error("malformed line: {0}")]
    Tokenize(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
