use thiserror::Error;

use crate::parse::ParseError;
use crate::GrammarError;

/// Unified error type covering parsing, validation, and I/O.
///
/// Returned by convenience methods like [`Grammar::from_ebnf()`](crate::Grammar::from_ebnf)
/// and [`Grammar::from_file()`](crate::Grammar::from_file).
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Generate(#[from] crate::GenerateError),

    #[error(transparent)]
    Policy(#[from] crate::PolicyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
