//! Diagnostic reporting
//!
//! The host engine owns the diagnostic channel, so every component takes a
//! [`Reporter`] instead of logging through a process-wide singleton.
//! [`TracingReporter`] is the production implementation; [`CollectingReporter`]
//! keeps messages in memory for assertions.

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Sink for diagnostics raised by the wrapper core.
pub trait Reporter: Send + Sync {
    fn report(&self, severity: Severity, message: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: "bqfdw", "{}", message),
            Severity::Info => tracing::info!(target: "bqfdw", "{}", message),
            Severity::Warning => tracing::warn!(target: "bqfdw", "{}", message),
            Severity::Error => tracing::error!(target: "bqfdw", "{}", message),
        }
    }
}

/// Records every diagnostic it receives.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages at or above `severity`.
    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|d| d.severity >= severity)
            .map(|d| d.message)
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, severity: Severity, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic {
                severity,
                message: message.to_string(),
            });
        }
    }
}

/// A reporter plus the verbosity switch.
///
/// With `verbose` off, debug and info diagnostics are dropped; warnings and
/// errors always reach the reporter.
#[derive(Clone)]
pub struct Diagnostics {
    reporter: Arc<dyn Reporter>,
    verbose: bool,
}

impl Diagnostics {
    pub fn new(reporter: Arc<dyn Reporter>, verbose: bool) -> Self {
        Self { reporter, verbose }
    }

    /// Diagnostics routed to `tracing`.
    pub fn tracing(verbose: bool) -> Self {
        Self::new(Arc::new(TracingReporter), verbose)
    }

    pub fn with_verbose(&self, verbose: bool) -> Self {
        Self {
            reporter: Arc::clone(&self.reporter),
            verbose,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn emit(&self, severity: Severity, message: &str) {
        if severity < Severity::Warning && !self.verbose {
            return;
        }
        self.reporter.report(severity, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(Severity::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(Severity::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.emit(Severity::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Severity::Error, message.as_ref());
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::tracing(true)
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
