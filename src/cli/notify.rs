//! Console notifications for command outcomes

use console::style;
use miette::Diagnostic;
use thiserror::Error;

use crate::views::Notifier;

/// Prints `✓`/`✗`/`•` lines to stderr so stdout stays pipeable
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✓").green(), message);
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("•").dim(), message);
        }
    }
}

/// The failure was already shown to the user; exit non-zero without
/// printing it again
#[derive(Debug, Error, Diagnostic)]
#[error("command failed")]
#[diagnostic(code(qcd::reported))]
pub struct Reported;

/// Notify about a failure and return the marker error
pub fn fail(notifier: &dyn Notifier, message: &str) -> miette::Report {
    notifier.error(message);
    Reported.into()
}
