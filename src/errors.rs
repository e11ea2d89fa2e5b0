//! Error handling for the trellis driver.

use derive_more::{Display, Error, From};
use trellis_ir::{ParseError, ValidationReport};

/// Result type for driver operations.
pub type TrellisResult<T> = std::result::Result<T, TrellisError>;

/// Errors that can occur while loading, checking or transforming a program.
#[derive(Debug, Display, Error, From)]
pub enum TrellisError {
    /// I/O errors when reading input or writing output.
    #[display("I/O error: {_0}")]
    Io(#[error(source)] std::io::Error),

    /// The input is not a well-formed text program.
    #[display("{_0}")]
    Parse(#[error(source)] ParseError),

    /// The program broke a structural invariant at some pipeline stage.
    #[from(ignore)]
    #[display("validation failed {stage}:\n{report}")]
    Validation {
        stage: String,
        report: ValidationReport,
    },

    /// No registered pass matches the requested name.
    #[from(ignore)]
    #[display("unknown pass '{_0}'")]
    UnknownPass(#[error(not(source))] String),
}
