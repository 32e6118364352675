//! Colored diagnostic reporting.

use colored::Colorize;

use baler_common::{Diagnostic, Log, Severity};

/// Render one diagnostic as `error: file: message` with severity coloring.
#[must_use]
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    let location = if diagnostic.file.is_empty() {
        String::new()
    } else {
        match diagnostic.span {
            Some(span) => format!("{}:{}: ", diagnostic.file, span.start),
            None => format!("{}: ", diagnostic.file),
        }
    };
    format!("{label}: {location}{}", diagnostic.text)
}

/// Print every accumulated diagnostic to stderr.
#[allow(clippy::print_stderr)]
pub fn report(log: &Log) {
    for diagnostic in log.msgs() {
        eprintln!("{}", format_diagnostic(diagnostic));
    }
}
