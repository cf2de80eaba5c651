//! Diagnostic module - Error collection and reporting.
//!
//! Every stage of the pipeline reports failures through a [`Handler`]. The
//! handler collects [`Diagnostic`] values and, when a sink is attached,
//! renders each one immediately as
//!
//! ```text
//! [line L] Error at '<lexeme>': <message>\r\n
//! ```
//!
//! with ` at end` substituted for the end-of-input token and no location
//! clause for scanner error tokens. The first error also marks the handler,
//! which the stages use as their fail-fast signal.
//!
//! # Examples
//!
//! ```
//! use lyra_util::{Handler, Locus};
//!
//! let handler = Handler::new();
//! handler.error(3, Locus::Lexeme("y".into()), "Undefined variable.");
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::io::Write;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that aborts the run
    Error,
    /// A warning that does not abort the run
    Warning,
    /// Additional information about a diagnostic
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
            Level::Warning => write!(f, "Warning"),
            Level::Note => write!(f, "Note"),
        }
    }
}

/// Where a diagnostic points in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locus {
    /// No usable location (scanner error tokens, internal failures)
    None,
    /// The end-of-input token
    End,
    /// The offending token's lexeme
    Lexeme(String),
}

/// A diagnostic message with severity and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level
    pub level: Level,
    /// Main diagnostic message
    pub message: String,
    /// Source line (1-based, 0 when unknown)
    pub line: u32,
    /// Location clause
    pub locus: Locus,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(line: u32, locus: Locus, message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            line,
            locus,
        }
    }

    /// Render in the reporting format, CRLF terminated.
    pub fn render(&self) -> String {
        let mut out = format!("[line {}] {}", self.line, self.level);
        match &self.locus {
            Locus::None => {}
            Locus::End => out.push_str(" at end"),
            Locus::Lexeme(lexeme) => {
                out.push_str(" at '");
                out.push_str(lexeme);
                out.push('\'');
            }
        }
        out.push_str(": ");
        out.push_str(&self.message);
        out.push_str("\r\n");
        out
    }
}

/// Handler for collecting and reporting diagnostics.
///
/// The handler is shared by reference across the pipeline stages, so all
/// state lives behind `RefCell`. An optional sink receives each diagnostic
/// as it is emitted; without one the handler only collects, which is what
/// the unit tests use.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
    sink: RefCell<Option<Box<dyn Write>>>,
}

impl Handler {
    /// Create a collecting handler with no sink.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            sink: RefCell::new(None),
        }
    }

    /// Create a handler that also writes each diagnostic to `sink`.
    pub fn with_sink(sink: Box<dyn Write>) -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            sink: RefCell::new(Some(sink)),
        }
    }

    /// Create a handler that reports to standard error.
    pub fn stderr() -> Self {
        Self::with_sink(Box::new(std::io::stderr()))
    }

    /// Emit a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        if let Some(sink) = self.sink.borrow_mut().as_mut() {
            // a broken sink must not abort error reporting
            let _ = sink.write_all(diagnostic.render().as_bytes());
            let _ = sink.flush();
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Report an error at the given line and locus.
    pub fn error(&self, line: u32, locus: Locus, message: impl Into<String>) {
        self.emit(Diagnostic::error(line, locus, message));
    }

    /// Check if any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Get a copy of all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clear all collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Error), "Error");
        assert_eq!(format!("{}", Level::Warning), "Warning");
    }

    #[test]
    fn test_render_with_lexeme() {
        let diag = Diagnostic::error(4, Locus::Lexeme("PI".into()), "Change a constant is not allowed.");
        assert_eq!(
            diag.render(),
            "[line 4] Error at 'PI': Change a constant is not allowed.\r\n"
        );
    }

    #[test]
    fn test_render_at_end() {
        let diag = Diagnostic::error(2, Locus::End, "Expect ';' after expression.");
        assert_eq!(
            diag.render(),
            "[line 2] Error at end: Expect ';' after expression.\r\n"
        );
    }

    #[test]
    fn test_render_without_locus() {
        let diag = Diagnostic::error(7, Locus::None, "Unknown token");
        assert_eq!(diag.render(), "[line 7] Error: Unknown token\r\n");
    }

    #[test]
    fn test_handler_counts() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        handler.error(1, Locus::None, "first");
        handler.error(2, Locus::None, "second");
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 2);
    }

    #[test]
    fn test_handler_clear() {
        let handler = Handler::new();
        handler.error(1, Locus::None, "boom");
        handler.clear();
        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
    }

    #[test]
    fn test_handler_sink_receives_rendered_output() {
        use std::sync::{Arc, Mutex};

        #[derive(Clone)]
        struct Shared(Arc<Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = Shared(Arc::new(Mutex::new(Vec::new())));
        let handler = Handler::with_sink(Box::new(buffer.clone()));
        handler.error(9, Locus::Lexeme("256".into()), "Range error: 256 is not in range of type uint8.");

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            written,
            "[line 9] Error at '256': Range error: 256 is not in range of type uint8.\r\n"
        );
    }
}
