//! # Crucible Core
//!
//! Data model for the Crucible exchange harness: request construction plans,
//! exchange results, the executor seam, and the harness error set.
//!
//! The flow these types support is strictly linear:
//!
//! ```text
//! RequestPlan ──finish()──▶ ConstructionPlan ──Executor──▶ ExchangeResult
//! ```
//!
//! The fluent surface lives in `crucible-harness`; this crate only defines
//! what flows through it.

#![doc(html_root_url = "https://docs.rs/crucible-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod executor;
pub mod plan;
pub mod result;

pub use error::{
    AssertionFailure, ConfigurationError, ExecutorError, HarnessError, HarnessResult,
};
pub use executor::{EchoExecutor, Executor, FixedExecutor, FnExecutor};
pub use plan::{ConstructionPlan, Cookie, Part, PlanBody, Principal, RequestPlan};
pub use result::{ExchangeResult, HandlerMetadata};
