use ox_core::error::Error;
use ox_core::span::Span;

/// Create a simple lowering error with default span
pub fn lowering_error(message: impl Into<String>) -> Error {
    Error::Generic(message.into())
}

/// Create a lowering error attributed to a source location
pub fn lowering_error_with_span(message: impl Into<String>, span: Span) -> Error {
    Error::Lowering(span, message.into())
}

/// Create a fatal internal-consistency error. These abort the compilation:
/// they indicate a compiler bug, not a user error.
pub fn internal_error(span: Span, message: impl Into<String>) -> Error {
    Error::Internal(span, message.into())
}

/// Create a generic error (when we don't have specific error information)
pub fn generic_error(message: impl Into<eyre::Error>) -> Error {
    Error::from(message.into())
}

// Convenience macros for generating lowering errors

/// Macro to return early with a lowering error
#[macro_export]
macro_rules! lower_bail {
    ($span:expr, $message:expr) => {
        return Err($crate::error::internal_error($span, $message))
    };
    ($span:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::internal_error($span, format!($fmt, $($arg)*)))
    };
}

/// Macro to ensure an upstream-guaranteed invariant holds, or abort with an
/// internal error
#[macro_export]
macro_rules! lower_ensure {
    ($cond:expr, $span:expr, $message:expr) => {
        if !($cond) {
            $crate::lower_bail!($span, $message);
        }
    };
    ($cond:expr, $span:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::lower_bail!($span, $fmt, $($arg)*);
        }
    };
}
