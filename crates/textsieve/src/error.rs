//! Error types for the textsieve library
//!
//! Textsieve uses a unified error type that wraps errors from all
//! sub-components. Only construction-time structural problems surface as
//! errors; query-time absence is an `Option`/`bool`, never a failure.

use thiserror::Error;

/// Main error type for textsieve operations
///
/// Every variant is a construction-time error: once a `Matcher` or
/// `SimpleMatcher` exists, its query operations cannot fail.
#[derive(Error, Debug)]
pub enum SieveError {
    /// Error from automaton construction
    #[error(transparent)]
    Automaton(#[from] textsieve_ac::AcError),

    /// A definition blob failed to decode
    #[error("definition decode failed: {0}")]
    Decode(String),

    /// A table definition is structurally invalid
    #[error("invalid table definition: {0}")]
    Table(String),

    /// The definition yields no searchable patterns at all
    #[error("empty pattern set: {0}")]
    EmptyPatternSet(String),
}

/// Result type alias for textsieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

impl From<rmp_serde::decode::Error> for SieveError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        SieveError::Decode(err.to_string())
    }
}
