//! # Crucible Harness
//!
//! The fluent build/execute/verify pipeline over an external mock executor.
//!
//! ## Pipeline
//!
//! ```text
//! Harness ──get()──▶ Perform ──perform()──▶ Exchange ──verify()──▶ ExchangeResult
//!                    BUILDING               EXECUTED               VERIFIED
//! ```
//!
//! Matchers assert over the result and fail fast; handlers observe it and
//! never raise. Both share one FIFO registration list drained in order.
//!
//! ## Example
//!
//! ```
//! use crucible_harness::matchers::{content, status};
//! use crucible_harness::Harness;
//!
//! let harness = Harness::fixed_response(http::StatusCode::OK, "hello");
//!
//! harness
//!     .get("/greeting")
//!     .expect(status().is_ok())
//!     .expect(content().contains("hello"))
//!     .run()
//!     .unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/crucible-harness/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod exchange;
pub mod handlers;
pub mod harness;
pub mod matchers;
pub mod render;

pub use exchange::{Exchange, ResultHandler, ResultMatcher, Verification};
pub use handlers::{log, print, Log, Print};
pub use harness::{Harness, HarnessConfig, Perform};
pub use render::render_exchange;
