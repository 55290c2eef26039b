//! Reporting of registry entries that break PEP 514
//!
//! Violations are normal on real machines with partial or legacy installs, so
//! they are only ever reported at a verbose level. The sink is passed into the
//! scan explicitly, which lets tests capture exactly what was reported.

use std::cell::RefCell;
use std::fmt;

/// One PEP 514 violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// `hive/vendor/tag[/subkey]`
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PEP-514 violation in Windows Registry at {} error: {}",
            self.path, self.message
        )
    }
}

/// Receiver for diagnostics produced during a scan
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// Emits diagnostics as `tracing` debug events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(path = %diagnostic.path, "{}", diagnostic);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Diagnostics whose path or message mention `needle`
    pub fn mentioning(&self, needle: &str) -> Vec<Diagnostic> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.path.contains(needle) || d.message.contains(needle))
            .cloned()
            .collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

impl<F: Fn(Diagnostic)> DiagnosticSink for F {
    fn report(&self, diagnostic: Diagnostic) {
        self(diagnostic);
    }
}
