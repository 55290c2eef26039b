use crate::logger;
use pyseek_registry::{Diagnostic, DiagnosticSink};

/// Forwards registry diagnostics to the debug channel of the CLI logger,
/// so they show up with `-v` and always land in the log file.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerSink;

impl DiagnosticSink for LoggerSink {
    fn report(&self, diagnostic: Diagnostic) {
        logger::debug(&diagnostic.to_string());
    }
}
