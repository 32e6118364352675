//! Diagnostics accumulated across scanning, linking and emission.
//!
//! All user-facing errors are recoverable: a pass records what went wrong and
//! keeps going so a single invocation reports the full set of diagnostics.
//! Whether the process ultimately fails is decided at the CLI boundary by
//! checking `Log::has_errors`.

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single diagnostic message, attached to a source location when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Pretty path of the file the message refers to; empty for bundle-level
    /// messages (e.g. output path conflicts).
    pub file: String,
    pub span: Option<Span>,
    pub text: String,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: Option<Span>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: file.into(),
            span,
            text: text.into(),
        }
    }

    pub fn warning(file: impl Into<String>, span: Option<Span>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            file: file.into(),
            span,
            text: text.into(),
        }
    }
}

/// Accumulator for diagnostics.
///
/// The scan stage merges per-worker diagnostic batches into one log on the
/// driver thread; the linker stages append directly.
#[derive(Debug, Default)]
pub struct Log {
    msgs: Vec<Diagnostic>,
}

impl Log {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, msg: Diagnostic) {
        self.msgs.push(msg);
    }

    pub fn add_error(&mut self, file: impl Into<String>, span: Option<Span>, text: impl Into<String>) {
        self.msgs.push(Diagnostic::error(file, span, text));
    }

    pub fn add_warning(
        &mut self,
        file: impl Into<String>,
        span: Option<Span>,
        text: impl Into<String>,
    ) {
        self.msgs.push(Diagnostic::warning(file, span, text));
    }

    pub fn extend(&mut self, msgs: Vec<Diagnostic>) {
        self.msgs.extend(msgs);
    }

    /// Drain all messages, e.g. to ship a worker's diagnostics back to the
    /// driver thread.
    pub fn take_msgs(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.msgs)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.msgs.iter().any(|m| m.severity == Severity::Error)
    }

    #[must_use]
    pub fn msgs(&self) -> &[Diagnostic] {
        &self.msgs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.msgs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.msgs.is_empty()
    }
}
