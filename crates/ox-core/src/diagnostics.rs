use crate::span::Span;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

/// Code attached to reports for features that are recognised but not yet
/// lowerable. Compilation continues past these, but the affected code path
/// will not produce a working binary.
pub const NOT_YET_SUPPORTED: &str = "not-yet-supported";

/// Code attached to numeric literals that fall outside the representable
/// range of their resolved type.
pub const OVERFLOW_ERROR: &str = "OverflowError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub span: Option<Span>,
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            span: None,
            code: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            span: None,
            code: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
            span: None,
            code: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(span) = &self.span {
            write!(f, " at {}", span)?;
        }
        Ok(())
    }
}

/// Shared sink for user-visible reports. Cloning shares the underlying
/// store, so the session and every lowering pass observe the same stream.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticManager {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticManager {
    pub fn new() -> Self {
        Self {
            diagnostics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_diagnostic(&self, diagnostic: Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic);
        }
    }

    /// Report a recoverable, user-attributable error at `span`.
    pub fn error(&self, span: Span, message: impl Into<String>) {
        self.add_diagnostic(Diagnostic::error(message).with_span(span));
    }

    pub fn error_with_code(&self, span: Span, message: impl Into<String>, code: &str) {
        self.add_diagnostic(Diagnostic::error(message).with_span(span).with_code(code));
    }

    /// Report a recognised-but-unimplemented construct. The caller proceeds
    /// without emitting anything for the affected node.
    pub fn deferred(&self, span: Span, message: impl Into<String>) {
        self.add_diagnostic(
            Diagnostic::error(message)
                .with_span(span)
                .with_code(NOT_YET_SUPPORTED),
        );
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .map(|d| d.iter().any(|diag| diag.level == DiagnosticLevel::Error))
            .unwrap_or(false)
    }

    pub fn has_deferred(&self) -> bool {
        self.diagnostics
            .lock()
            .map(|d| {
                d.iter()
                    .any(|diag| diag.code.as_deref() == Some(NOT_YET_SUPPORTED))
            })
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.clear();
        }
    }
}
