//! Error kinds for the inference core.
//!
//! Library code returns `Result<T, WordsegError>`; CLI binaries adapt these
//! with `anyhow::Context` at the boundary, the same split the teacher crate
//! uses between its `toml`/`redb`-backed library errors and the `anyhow`
//! based `tools/*` binaries.

use std::fmt;

#[derive(Debug)]
pub enum WordsegError {
    /// Empty utterance, unreadable grammar rule, `a`/`b` out of range.
    MalformedInput(String),
    /// Detected during CKY fill or `decrtree`; caller should skip the
    /// sentence on first pass and retry, per the error handling design.
    NumericUnderflow(String),
    /// The predictive (Earley) filter rejected the start symbol at the
    /// full span: no derivation exists.
    ParseFailure(String),
    /// A restaurant/adaptor invariant was violated; always indicates a bug.
    InvariantViolation(String),
    /// Conflicting CLI/config settings (e.g. flip + online, decayed + batch).
    ConfigConflict(String),
}

impl fmt::Display for WordsegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordsegError::MalformedInput(m) => write!(f, "malformed input: {m}"),
            WordsegError::NumericUnderflow(m) => write!(f, "numeric underflow: {m}"),
            WordsegError::ParseFailure(m) => write!(f, "parse failure: {m}"),
            WordsegError::InvariantViolation(m) => write!(f, "invariant violation: {m}"),
            WordsegError::ConfigConflict(m) => write!(f, "configuration conflict: {m}"),
        }
    }
}

impl std::error::Error for WordsegError {}
