pub mod context;
pub mod diagnostics;
pub mod embed;
pub mod error;
pub mod hir;
pub mod span;
pub mod tree;
pub mod types;

// Re-export commonly used items for convenience
pub use tracing;

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
