//! Error types produced by rule parsing, canonicalization, and corpus reading.

use thiserror::Error;

/// Failures the core crate can report.
///
/// `InternalEvalError` from spec's error table has no variant here: the
/// evaluator is total (every operator match has a fallthrough to `false`),
/// so falling off the end of an operator match is a programming error and is
/// asserted against in debug builds rather than modeled as a `Result`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// The rule string could not be tokenized or parsed.
    #[error("could not parse rule `{0}`")]
    Parse(String),

    /// The rule parsed, but canonicalization rejected it (division that does
    /// not reduce, or no variable remaining after expansion).
    #[error("rule is ill-formed: {0}")]
    IllFormedRule(String),

    /// A puzzle corpus file is malformed (bad header, truncated rule list).
    #[error("malformed puzzle corpus: {0}")]
    Corpus(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PuzzleError>;
