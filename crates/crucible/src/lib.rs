//! # Crucible
//!
//! **Fluent mock-exchange test harness**
//!
//! Crucible is a thin, declarative layer over an external mock executor:
//!
//! - **Request builder** - accumulate request intent into an immutable
//!   construction plan
//! - **Execution step** - hand the plan to the executor exactly once
//! - **Result verifier** - drain an ordered list of matchers (fail-fast
//!   assertions) and handlers (best-effort observers) against the result
//!
//! ## Quick Start
//!
//! ```
//! use crucible::prelude::*;
//!
//! let harness = Harness::echo();
//!
//! harness
//!     .get("/person/{name}")
//!     .var("Lee")
//!     .accept("application/json")
//!     .expect(status().is_ok())
//!     .expect(json_path("$.path").value("/person/Lee"))
//!     .run()
//!     .unwrap();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Perform ──perform()──▶ Exchange ──verify()──▶ ExchangeResult
//! BUILDING               EXECUTED               VERIFIED
//! ```
//!
//! The three states are forward-only; a verified plan is terminal and a new
//! verification starts from a fresh plan.

#![doc(html_root_url = "https://docs.rs/crucible/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use crucible_core as core;

// Re-export the fluent pipeline
pub use crucible_harness as harness;

// Re-export registration sugar
pub use crucible_registry as registry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use crucible::prelude::*;
/// ```
pub mod prelude {
    pub use crucible_core::{
        AssertionFailure, ConfigurationError, ConstructionPlan, Cookie, EchoExecutor,
        ExchangeResult, Executor, ExecutorError, FixedExecutor, FnExecutor, HandlerMetadata,
        HarnessError, HarnessResult, Part, PlanBody, Principal, RequestPlan,
    };

    // Re-export the pipeline types
    pub use crucible_harness::{
        Exchange, Harness, HarnessConfig, Perform, ResultHandler, ResultMatcher, Verification,
    };

    // Re-export matcher factories
    pub use crucible_harness::matchers::{
        content, cookie, flash, forwarded_url, forwarded_url_pattern, header, json_path, model,
        redirected_url, redirected_url_pattern, session, status, view,
    };

    // Re-export handler factories
    pub use crucible_harness::handlers::{log, print, Log, Print};

    // Re-export registration sugar
    pub use crucible_registry::{
        Definition, MapRegistry, Registrar, Registration, Registry, RegistryError,
    };
}
