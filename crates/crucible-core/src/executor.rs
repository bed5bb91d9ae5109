//! The execution seam.
//!
//! The harness never dispatches anything itself; a finalized plan is handed
//! to an [`Executor`] exactly once and whatever the executor returns (result
//! or failure) is surfaced unchanged. Framework adapters implement this trait
//! against their own mock dispatch entry points.

use crate::error::ExecutorError;
use crate::plan::ConstructionPlan;
use crate::result::ExchangeResult;
use http::StatusCode;

/// External component that performs a mock request.
///
/// Implementations are invoked exactly once per plan. The trait is
/// synchronous; adapters for async frameworks block inside their own
/// `execute` implementation.
pub trait Executor {
    /// Executes the plan and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] for transport-level failures. The harness
    /// does not retry or wrap these.
    fn execute(&self, plan: ConstructionPlan) -> Result<ExchangeResult, ExecutorError>;
}

/// Adapter turning a plain function into an [`Executor`].
///
/// # Example
///
/// ```
/// use crucible_core::executor::{Executor, FnExecutor};
/// use crucible_core::plan::RequestPlan;
/// use crucible_core::result::ExchangeResult;
/// use http::StatusCode;
///
/// let executor = FnExecutor::new(|plan| {
///     Ok(ExchangeResult::new(plan.method().clone(), plan.uri().clone(), StatusCode::OK))
/// });
///
/// let plan = RequestPlan::get("/ping").finish().unwrap();
/// let result = executor.execute(plan).unwrap();
/// assert_eq!(result.status_code(), 200);
/// ```
pub struct FnExecutor<F> {
    function: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(ConstructionPlan) -> Result<ExchangeResult, ExecutorError>,
{
    /// Wraps the given function.
    #[must_use]
    pub const fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(ConstructionPlan) -> Result<ExchangeResult, ExecutorError>,
{
    fn execute(&self, plan: ConstructionPlan) -> Result<ExchangeResult, ExecutorError> {
        (self.function)(plan)
    }
}

/// Executor that echoes the dispatched method and path as a JSON body.
///
/// Useful for exercising the harness itself without a real framework behind
/// it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

impl Executor for EchoExecutor {
    fn execute(&self, plan: ConstructionPlan) -> Result<ExchangeResult, ExecutorError> {
        let body = serde_json::json!({
            "method": plan.method().as_str(),
            "path": plan.uri().path(),
        })
        .to_string();
        Ok(
            ExchangeResult::new(plan.method().clone(), plan.uri().clone(), StatusCode::OK)
                .with_header("content-type", "application/json")
                .with_body(body),
        )
    }
}

/// Executor that always answers with one fixed status and body.
#[derive(Debug, Clone)]
pub struct FixedExecutor {
    status: StatusCode,
    body: String,
}

impl FixedExecutor {
    /// Creates an executor answering every plan with the given response.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

impl Executor for FixedExecutor {
    fn execute(&self, plan: ConstructionPlan) -> Result<ExchangeResult, ExecutorError> {
        Ok(
            ExchangeResult::new(plan.method().clone(), plan.uri().clone(), self.status)
                .with_body(self.body.clone()),
        )
    }
}
