//! The executed half of the pipeline.
//!
//! A plan moves through three states, each transition triggered by exactly
//! one call and never reversed:
//!
//! ```text
//! BUILDING ──perform()──▶ EXECUTED ──verify()──▶ VERIFIED
//! ```
//!
//! [`Exchange`] is the EXECUTED state: it owns the executor's result and the
//! verification list that was registered while building. [`Exchange::verify`]
//! consumes it, drains the list in registration order, and yields the bare
//! result - the VERIFIED state is terminal, so another verification needs a
//! fresh plan.

use crucible_core::error::AssertionFailure;
use crucible_core::result::ExchangeResult;

/// An assertion over an exchange result.
///
/// Any `Fn(&ExchangeResult) -> Result<(), AssertionFailure>` closure is a
/// matcher; the factories in [`crate::matchers`] produce the common ones.
pub trait ResultMatcher {
    /// Checks the result, raising on mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionFailure`] when the result does not satisfy the
    /// expectation.
    fn matches(&self, result: &ExchangeResult) -> Result<(), AssertionFailure>;
}

impl<F> ResultMatcher for F
where
    F: Fn(&ExchangeResult) -> Result<(), AssertionFailure>,
{
    fn matches(&self, result: &ExchangeResult) -> Result<(), AssertionFailure> {
        self(result)
    }
}

/// A side-effecting observer of an exchange result.
///
/// Handlers are best-effort instrumentation: they never raise, and a failure
/// inside one (an unwritable target, say) is swallowed.
pub trait ResultHandler {
    /// Observes the result.
    fn handle(&self, result: &ExchangeResult);
}

impl<F> ResultHandler for F
where
    F: Fn(&ExchangeResult),
{
    fn handle(&self, result: &ExchangeResult) {
        self(result);
    }
}

/// One registered verification step: an assertion or an observer.
pub enum Verification {
    /// A matcher; its failure halts verification.
    Expect(Box<dyn ResultMatcher>),
    /// A handler; runs for its side effect only.
    Inspect(Box<dyn ResultHandler>),
}

/// An executed plan awaiting verification.
pub struct Exchange {
    result: ExchangeResult,
    verifications: Vec<Verification>,
}

impl Exchange {
    /// Pairs an executor result with the verification list registered while
    /// the plan was being built.
    #[must_use]
    pub fn new(result: ExchangeResult, verifications: Vec<Verification>) -> Self {
        Self {
            result,
            verifications,
        }
    }

    /// Returns the underlying result without verifying.
    #[must_use]
    pub const fn result(&self) -> &ExchangeResult {
        &self.result
    }

    /// Applies every registered verification in registration order.
    ///
    /// Matchers and handlers share one FIFO list: a handler registered before
    /// a failing matcher runs, one registered after it does not. The first
    /// matcher failure propagates immediately. Consumes the exchange and
    /// returns the bare result on success.
    ///
    /// # Errors
    ///
    /// Returns the first [`AssertionFailure`] raised by a matcher.
    pub fn verify(self) -> Result<ExchangeResult, AssertionFailure> {
        for verification in &self.verifications {
            match verification {
                Verification::Expect(matcher) => matcher.matches(&self.result)?,
                Verification::Inspect(handler) => handler.handle(&self.result),
            }
        }
        Ok(self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode, Uri};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ok_result() -> ExchangeResult {
        ExchangeResult::new(Method::GET, Uri::from_static("/t"), StatusCode::OK)
    }

    fn failing_matcher(label: &str) -> impl ResultMatcher {
        let message = format!("{label} failed");
        move |_result: &ExchangeResult| -> Result<(), AssertionFailure> {
            Err(AssertionFailure::new(message.clone()))
        }
    }

    fn counting_matcher(counter: Arc<AtomicUsize>) -> impl ResultMatcher {
        move |_result: &ExchangeResult| -> Result<(), AssertionFailure> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn counting_handler(counter: Arc<AtomicUsize>) -> impl ResultHandler {
        move |_result: &ExchangeResult| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_verify_runs_in_registration_order() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let exchange = Exchange::new(
            ok_result(),
            vec![
                Verification::Expect(Box::new(counting_matcher(Arc::clone(&a)))),
                Verification::Expect(Box::new(counting_matcher(Arc::clone(&b)))),
            ],
        );
        exchange.verify().unwrap();
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_matcher_failure_halts_remaining() {
        let after = Arc::new(AtomicUsize::new(0));
        let exchange = Exchange::new(
            ok_result(),
            vec![
                Verification::Expect(Box::new(failing_matcher("B"))),
                Verification::Expect(Box::new(counting_matcher(Arc::clone(&after)))),
            ],
        );
        let error = exchange.verify().unwrap_err();
        assert_eq!(error.message(), "B failed");
        assert_eq!(after.load(Ordering::SeqCst), 0, "C must never be evaluated");
    }

    #[test]
    fn test_handler_before_failing_matcher_still_runs() {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let exchange = Exchange::new(
            ok_result(),
            vec![
                Verification::Inspect(Box::new(counting_handler(Arc::clone(&before)))),
                Verification::Expect(Box::new(failing_matcher("middle"))),
                Verification::Inspect(Box::new(counting_handler(Arc::clone(&after)))),
            ],
        );
        assert!(exchange.verify().is_err());
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_verify_yields_result() {
        let exchange = Exchange::new(ok_result(), Vec::new());
        let result = exchange.verify().unwrap();
        assert_eq!(result.status_code(), 200);
    }
}
