//! Per-row progress output.
//!
//! Imports print one character per processed row on stdout, mirroring the
//! operator workflow the importer teams are used to: `.` imported, `s`
//! skipped, `x` failed. Detail goes through `tracing` and, via the CLI, to
//! an optional log file. The progress channel can be silenced for JSON
//! output and for tests.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Row-level progress indicator.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    enabled: Arc<AtomicBool>,
    line_len: Arc<AtomicUsize>,
}

/// Wrap long progress lines so terminal output stays readable.
const LINE_WIDTH: usize = 80;

impl ProgressLog {
    pub fn new() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(true)),
            line_len: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Progress indicator that prints nothing.
    pub fn silent() -> Self {
        let progress = Self::new();
        progress.set_enabled(false);
        progress
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Start a named section: terminates any open line and prints the
    /// importer name as a prefix for the symbols that follow.
    pub fn section(&self, name: &str) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        self.end_line();
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "{name}: ");
        let _ = stdout.flush();
    }

    /// A row was written to the target system.
    pub fn imported(&self) {
        self.emit('.');
    }

    /// A row was skipped because it was already imported.
    pub fn skipped(&self) {
        self.emit('s');
    }

    /// A row failed and was recorded in the report.
    pub fn failed(&self) {
        self.emit('x');
    }

    /// Terminate the current progress line, if any characters were printed.
    pub fn end_line(&self) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        if self.line_len.swap(0, Ordering::Relaxed) > 0 {
            println!();
        }
    }

    fn emit(&self, symbol: char) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let mut stdout = std::io::stdout();
        let len = self.line_len.fetch_add(1, Ordering::Relaxed) + 1;
        if len > LINE_WIDTH {
            let _ = writeln!(stdout);
            self.line_len.store(1, Ordering::Relaxed);
        }
        let _ = write!(stdout, "{symbol}");
        let _ = stdout.flush();
    }
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new()
    }
}
