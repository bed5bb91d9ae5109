//! Handler factories for exchange results.
//!
//! Handlers observe a result without asserting anything; they run inline
//! during verification and never raise. Write failures on a print target are
//! deliberately swallowed.

use crate::exchange::ResultHandler;
use crate::render::render_exchange;
use crucible_core::error::ConfigurationError;
use crucible_core::result::ExchangeResult;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};

/// Creates a print handler targeting stdout.
///
/// Redirect it with [`Print::to_stderr`] or [`Print::to_writer`]; a print
/// handler accepts at most one output target.
#[must_use]
pub fn print() -> Print {
    Print::new()
}

/// Creates a log handler emitting the rendered exchange at DEBUG.
#[must_use]
pub const fn log() -> Log {
    Log
}

enum PrintTarget {
    Stdout,
    Stderr,
    Writer(Mutex<Box<dyn Write + Send>>),
}

impl fmt::Debug for PrintTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("Stdout"),
            Self::Stderr => f.write_str("Stderr"),
            Self::Writer(_) => f.write_str("Writer"),
        }
    }
}

/// Handler that renders the full exchange to an output target.
///
/// With no explicit target the rendering goes to stdout. Supplying a second
/// target is a configuration conflict and raises immediately:
///
/// ```
/// use crucible_harness::handlers::print;
///
/// let handler = print().to_stderr().unwrap();
/// let error = handler.to_writer(Vec::new()).unwrap_err();
/// assert!(error.to_string().contains("output target"));
/// ```
#[must_use]
#[derive(Debug, Default)]
pub struct Print {
    target: Option<PrintTarget>,
}

impl Print {
    /// Creates a print handler with the default stdout target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directs output to stdout explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if an output target was already set.
    pub fn to_stdout(self) -> Result<Self, ConfigurationError> {
        self.set_target(PrintTarget::Stdout)
    }

    /// Directs output to stderr.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if an output target was already set.
    pub fn to_stderr(self) -> Result<Self, ConfigurationError> {
        self.set_target(PrintTarget::Stderr)
    }

    /// Directs output to an arbitrary writer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if an output target was already set.
    pub fn to_writer(self, writer: impl Write + Send + 'static) -> Result<Self, ConfigurationError> {
        self.set_target(PrintTarget::Writer(Mutex::new(Box::new(writer))))
    }

    fn set_target(mut self, target: PrintTarget) -> Result<Self, ConfigurationError> {
        if self.target.is_some() {
            return Err(ConfigurationError::new(
                "print handler already has an output target",
            ));
        }
        self.target = Some(target);
        Ok(self)
    }
}

impl ResultHandler for Print {
    fn handle(&self, result: &ExchangeResult) {
        let rendered = render_exchange(result);
        match &self.target {
            None | Some(PrintTarget::Stdout) => {
                let _ = io::stdout().write_all(rendered.as_bytes());
            }
            Some(PrintTarget::Stderr) => {
                let _ = io::stderr().write_all(rendered.as_bytes());
            }
            Some(PrintTarget::Writer(writer)) => {
                let _ = writer.lock().write_all(rendered.as_bytes());
            }
        }
    }
}

/// Handler that emits the rendered exchange through `tracing` at DEBUG.
#[derive(Debug, Clone, Copy)]
pub struct Log;

impl ResultHandler for Log {
    fn handle(&self, result: &ExchangeResult) {
        tracing::debug!(status = result.status_code(), "{}", render_exchange(result));
    }
}
