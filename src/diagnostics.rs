//! Diagnostics reporting for recoverable placement conditions.
//!
//! Property-level problems (missing property, bad coercion, failed write) are
//! reported through an injected [`DiagnosticSink`] instead of aborting the
//! batch. The core holds no global error collector; callers choose where the
//! reports go.

use std::cell::RefCell;

use crate::session::InstanceHandle;

/// How serious a reported condition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// The category of a reported condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A requested property name pattern matched nothing.
    MissingProperty,
    /// A matched property's value could not be coerced to the requested type.
    TypeMismatch,
    /// Applying a value to a fixed-text or parametric field faulted.
    WriteFailure,
    /// A template failed to delete during release.
    CleanupFailure,
}

/// One reported condition, with enough context to locate the subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    /// Name (or pattern) of the property involved, when there is one.
    pub property: Option<String>,
    /// The symbol instance the condition belongs to, when known.
    pub subject: Option<InstanceHandle>,
}

impl Diagnostic {
    pub fn missing_property(pattern: &str, subject: Option<InstanceHandle>) -> Self {
        Self {
            kind: DiagnosticKind::MissingProperty,
            severity: Severity::Error,
            message: format!("property '{}' not found", pattern),
            property: Some(pattern.to_string()),
            subject,
        }
    }

    pub fn type_mismatch(pattern: &str, stored: &str, subject: Option<InstanceHandle>) -> Self {
        Self {
            kind: DiagnosticKind::TypeMismatch,
            severity: Severity::Error,
            message: format!("property '{}' holds incompatible value {}", pattern, stored),
            property: Some(pattern.to_string()),
            subject,
        }
    }

    pub fn write_failure(
        name: &str,
        attempted: &str,
        symbol: &str,
        subject: Option<InstanceHandle>,
    ) -> Self {
        Self {
            kind: DiagnosticKind::WriteFailure,
            severity: Severity::Error,
            message: format!(
                "failed to write '{}' = {} in symbol '{}'",
                name, attempted, symbol
            ),
            property: Some(name.to_string()),
            subject,
        }
    }

    pub fn cleanup_failure(subject: InstanceHandle, reason: &str) -> Self {
        Self {
            kind: DiagnosticKind::CleanupFailure,
            severity: Severity::Warning,
            message: format!("failed to delete template: {}", reason),
            property: None,
            subject: Some(subject),
        }
    }
}

/// Destination for diagnostics. Implementations use interior mutability so
/// the core can report through a shared reference.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that forwards every diagnostic through the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{}", diagnostic.message),
            Severity::Error => log::error!("{}", diagnostic.message),
        }
    }
}

/// Sink that keeps every diagnostic for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: RefCell<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics reported so far, in report order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Count of diagnostics of one kind.
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.borrow_mut().push(diagnostic);
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}
