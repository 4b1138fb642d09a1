use crate::diagnostics::Diagnostic;
use crate::span::Span;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A user-facing lowering error that has already been reported through
    /// the diagnostics sink. The surrounding expression continues with the
    /// error sentinel value.
    #[error("lowering error at {0}: {1}")]
    Lowering(Span, String),
    /// A violated invariant that the upstream stages (type checking, name
    /// resolution) should have made impossible. Aborts the compilation.
    #[error("internal compiler error at {0}: {1}")]
    Internal(Span, String),
    #[error("generic error: {0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn diagnostic(diagnostic: Diagnostic) -> Self {
        match diagnostic.span {
            Some(span) => Error::Lowering(span, diagnostic.message),
            None => Error::Generic(diagnostic.message),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Internal(..))
    }
}

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

// Convert from std::io::Error to our Error type
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
