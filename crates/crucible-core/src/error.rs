//! Error types for the Crucible harness.
//!
//! The harness raises exactly two error kinds of its own:
//!
//! - [`AssertionFailure`] - a matcher found the result does not satisfy an
//!   expectation. Verification halts at the first failure.
//! - [`ConfigurationError`] - mutually exclusive or unusable options were
//!   supplied while configuring a plan or handler. Raised at configuration
//!   time, never deferred to execution.
//!
//! Everything else is an [`ExecutorError`]: a failure inside the external
//! executor, passed through unchanged with no retry or wrapping semantics.

use thiserror::Error;

/// Result type alias using [`HarnessError`].
pub type HarnessResult<T> = Result<T, HarnessError>;

/// An expectation over an exchange result was not met.
///
/// Raised by matchers during verification. The first failure propagates to
/// the caller and stops evaluation of the remaining matchers.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    /// Creates an assertion failure with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates an assertion failure describing an expected/actual mismatch.
    #[must_use]
    pub fn mismatch(
        subject: &str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::new(format!("{subject}: expected {expected}, got {actual}"))
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Conflicting or unusable options were supplied during configuration.
///
/// Raised eagerly by the configuring call itself, for example when a print
/// handler is given two output targets or a URL template variable has no
/// value.
#[derive(Debug, Error)]
#[error("invalid configuration: {message}")]
pub struct ConfigurationError {
    message: String,
}

impl ConfigurationError {
    /// Creates a configuration error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failure raised by the external executor.
///
/// The harness never retries or reinterprets these; they surface to the
/// caller exactly as the executor produced them.
#[derive(Debug, Error)]
#[error("executor failure: {message}")]
pub struct ExecutorError {
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

impl ExecutorError {
    /// Creates an executor error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an executor error with a message and an underlying cause.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Umbrella error for a full build/execute/verify chain.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A matcher rejected the exchange result.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// The plan or a handler was misconfigured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The external executor failed; surfaced unchanged.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl HarnessError {
    /// Returns `true` if this is an assertion failure.
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` if this error came from the executor.
    #[must_use]
    pub const fn is_executor(&self) -> bool {
        matches!(self, Self::Executor(_))
    }
}
