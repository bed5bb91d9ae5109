//! Harness entry point and the building state of the pipeline.
//!
//! A [`Harness`] wraps one [`Executor`] plus configuration and hands out
//! [`Perform`] builders via its method helpers. A `Perform` accumulates both
//! the construction plan and the verification list; `perform()` dispatches
//! through the executor exactly once, `run()` additionally verifies.
//!
//! # Example
//!
//! ```
//! use crucible_harness::matchers::{json_path, status};
//! use crucible_harness::Harness;
//!
//! let harness = Harness::echo();
//! let result = harness
//!     .get("/person/{name}")
//!     .var("Lee")
//!     .accept("application/json")
//!     .expect(status().is_ok())
//!     .expect(json_path("$.method").value("GET"))
//!     .run()
//!     .unwrap();
//! assert_eq!(result.status_code(), 200);
//! ```

use crate::exchange::{Exchange, ResultHandler, ResultMatcher, Verification};
use crate::handlers;
use crucible_core::error::HarnessError;
use crucible_core::executor::{EchoExecutor, Executor, FixedExecutor};
use crucible_core::plan::{Cookie, Part, Principal, RequestPlan};
use crucible_core::result::ExchangeResult;
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Headers applied to every plan before user-set headers.
    pub default_headers: Vec<(String, String)>,

    /// Prefix prepended to every URL template.
    pub base_path: Option<String>,

    /// Whether each dispatch emits DEBUG trace events.
    pub log_exchanges: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            default_headers: Vec::new(),
            base_path: None,
            log_exchanges: true,
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration with dispatch tracing disabled.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            log_exchanges: false,
            ..Self::default()
        }
    }
}

/// Entry point of the fluent pipeline.
///
/// Holds the external executor; every method helper opens a fresh plan with
/// no state shared between plans beyond the configured defaults.
#[must_use]
pub struct Harness<E> {
    executor: E,
    config: HarnessConfig,
}

impl<E: Executor> Harness<E> {
    /// Creates a harness around an executor with default configuration.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            config: HarnessConfig::default(),
        }
    }

    /// Creates a harness with explicit configuration.
    pub fn with_config(executor: E, config: HarnessConfig) -> Self {
        Self { executor, config }
    }

    /// Adds a header applied to every plan this harness opens.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.config
            .default_headers
            .push((name.into(), value.into()));
        self
    }

    /// Returns the harness configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Opens a GET plan.
    pub fn get(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::GET, template)
    }

    /// Opens a POST plan.
    pub fn post(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::POST, template)
    }

    /// Opens a PUT plan.
    pub fn put(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::PUT, template)
    }

    /// Opens a PATCH plan.
    pub fn patch(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::PATCH, template)
    }

    /// Opens a DELETE plan.
    pub fn delete(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::DELETE, template)
    }

    /// Opens an OPTIONS plan.
    pub fn options(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::OPTIONS, template)
    }

    /// Opens a HEAD plan.
    pub fn head(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::HEAD, template)
    }

    /// Opens a plan with an arbitrary method.
    pub fn request(&self, method: Method, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(method, template)
    }

    /// Opens a POST plan intended for a multipart body; combine with
    /// [`Perform::parts`].
    pub fn multipart(&self, template: impl AsRef<str>) -> Perform<'_, E> {
        self.start(Method::POST, template)
    }

    fn start(&self, method: Method, template: impl AsRef<str>) -> Perform<'_, E> {
        let mut plan = RequestPlan::request(method, template.as_ref());
        if let Some(base_path) = &self.config.base_path {
            plan = plan.prefixed(base_path);
        }
        for (name, value) in &self.config.default_headers {
            plan = plan.header(name, value);
        }
        Perform {
            harness: self,
            plan,
            verifications: Vec::new(),
        }
    }
}

impl Harness<EchoExecutor> {
    /// Creates a harness over an executor echoing method and path as JSON.
    pub fn echo() -> Self {
        Self::new(EchoExecutor)
    }
}

impl Harness<FixedExecutor> {
    /// Creates a harness whose executor answers every plan with one fixed
    /// response.
    pub fn fixed_response(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(FixedExecutor::new(status, body))
    }
}

/// A plan being built against a harness, together with its verification list.
///
/// This is the BUILDING state: plan setters and `expect`/`inspect`
/// registrations may be freely interleaved, and the registration list is
/// append-only until [`Perform::perform`] executes the plan.
#[must_use]
pub struct Perform<'a, E> {
    harness: &'a Harness<E>,
    plan: RequestPlan,
    verifications: Vec<Verification>,
}

impl<E: Executor> Perform<'_, E> {
    /// Appends one URL template substitution variable.
    pub fn var(mut self, value: impl Into<String>) -> Self {
        self.plan = self.plan.var(value);
        self
    }

    /// Appends several URL template substitution variables.
    pub fn vars<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plan = self.plan.vars(values);
        self
    }

    /// Sets a header, replacing previously set values for that name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.plan = self.plan.header(name, value);
        self
    }

    /// Sets a multi-valued header, replacing previously set values.
    pub fn header_values<I, S>(mut self, name: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.plan = self.plan.header_values(name, values);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.plan = self.plan.content_type(content_type);
        self
    }

    /// Sets the Accept header.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.plan = self.plan.accept(accept);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.plan = self.plan.bearer_token(token);
        self
    }

    /// Appends a query/form parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.plan = self.plan.param(name, value);
        self
    }

    /// Appends several query/form parameters.
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.plan = self.plan.params(params);
        self
    }

    /// Sets a raw byte body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.plan = self.plan.body(body);
        self
    }

    /// Sets a string body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.plan = self.plan.text(body);
        self
    }

    /// Sets a JSON body and content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.plan = self.plan.json(value);
        self
    }

    /// Sets a form-urlencoded body and content type.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.plan = self.plan.form(value);
        self
    }

    /// Sets a multipart body and content type.
    pub fn parts<I>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = Part>,
    {
        self.plan = self.plan.parts(parts);
        self
    }

    /// Appends a cookie.
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.plan = self.plan.cookie(cookie);
        self
    }

    /// Appends several cookies.
    pub fn cookies<I>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = Cookie>,
    {
        self.plan = self.plan.cookies(cookies);
        self
    }

    /// Appends a locale preference.
    pub fn locale(mut self, tag: impl Into<String>) -> Self {
        self.plan = self.plan.locale(tag);
        self
    }

    /// Sets a request-scoped attribute.
    pub fn request_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.plan = self.plan.request_attr(name, value);
        self
    }

    /// Sets a session attribute.
    pub fn session_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.plan = self.plan.session_attr(name, value);
        self
    }

    /// Sets several session attributes.
    pub fn session_attrs<I, K>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.plan = self.plan.session_attrs(attrs);
        self
    }

    /// Sets a flash attribute.
    pub fn flash_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.plan = self.plan.flash_attr(name, value);
        self
    }

    /// Sets several flash attributes.
    pub fn flash_attrs<I, K>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.plan = self.plan.flash_attrs(attrs);
        self
    }

    /// Marks the plan as using a secure channel.
    pub fn secure(mut self, secure: bool) -> Self {
        self.plan = self.plan.secure(secure);
        self
    }

    /// Sets the authenticated principal.
    pub fn principal(mut self, principal: Principal) -> Self {
        self.plan = self.plan.principal(principal);
        self
    }

    /// Registers a matcher; matchers and handlers share one FIFO list.
    pub fn expect(mut self, matcher: impl ResultMatcher + 'static) -> Self {
        self.verifications
            .push(Verification::Expect(Box::new(matcher)));
        self
    }

    /// Registers a handler; matchers and handlers share one FIFO list.
    pub fn inspect(mut self, handler: impl ResultHandler + 'static) -> Self {
        self.verifications
            .push(Verification::Inspect(Box::new(handler)));
        self
    }

    /// Registers a stdout print handler.
    pub fn print(self) -> Self {
        self.inspect(handlers::print())
    }

    /// Registers a DEBUG log handler.
    pub fn log(self) -> Self {
        self.inspect(handlers::log())
    }

    /// Finalizes the plan and dispatches it through the executor, exactly
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Configuration`] when the plan cannot be
    /// finalized, or the executor's failure unchanged.
    pub fn perform(self) -> Result<Exchange, HarnessError> {
        let plan = self.plan.finish()?;
        let log_exchanges = self.harness.config.log_exchanges;
        let exchange_id = Uuid::now_v7();
        if log_exchanges {
            tracing::debug!(
                exchange_id = %exchange_id,
                method = %plan.method(),
                uri = %plan.uri(),
                "dispatching plan"
            );
        }
        let result = self.harness.executor.execute(plan)?;
        if log_exchanges {
            tracing::debug!(
                exchange_id = %exchange_id,
                status = result.status_code(),
                "exchange complete"
            );
        }
        Ok(Exchange::new(result, self.verifications))
    }

    /// Dispatches and verifies in one call.
    ///
    /// # Errors
    ///
    /// Returns the first error of the chain: configuration, executor, or
    /// assertion.
    pub fn run(self) -> Result<ExchangeResult, HarnessError> {
        let exchange = self.perform()?;
        exchange.verify().map_err(HarnessError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::{content, header, json_path, status};
    use crucible_core::error::{AssertionFailure, ExecutorError};
    use crucible_core::executor::FnExecutor;
    use crucible_core::plan::ConstructionPlan;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_echo_round_trip() {
        let harness = Harness::echo();
        let result = harness
            .get("/person/{name}")
            .var("Lee")
            .expect(status().is_ok())
            .expect(json_path("$.path").value("/person/Lee"))
            .run()
            .unwrap();
        assert_eq!(result.status_code(), 200);
    }

    #[test]
    fn test_fixed_response() {
        let harness = Harness::fixed_response(StatusCode::CREATED, "created");
        harness
            .post("/items")
            .expect(status().is_created())
            .expect(content().string("created"))
            .run()
            .unwrap();
    }

    #[test]
    fn test_failing_status_matcher_halts_body_matcher() {
        let harness = Harness::fixed_response(StatusCode::NOT_FOUND, "hello");
        let error = harness
            .get("/missing")
            .expect(status().is_ok())
            .expect(content().contains("hello"))
            .run()
            .unwrap_err();
        assert!(error.is_assertion());
        assert!(error.to_string().contains("expected 200, got 404"));
    }

    #[test]
    fn test_executor_error_passes_through() {
        let harness = Harness::new(FnExecutor::new(|_plan: ConstructionPlan| {
            Err(ExecutorError::new("dispatch exploded"))
        }));
        let error = harness.get("/x").run().unwrap_err();
        assert!(error.is_executor());
        assert_eq!(error.to_string(), "executor failure: dispatch exploded");
    }

    #[test]
    fn test_default_headers_are_overridable() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_in_executor = Arc::clone(&seen);
        let harness = Harness::new(FnExecutor::new(move |plan: ConstructionPlan| {
            seen_in_executor
                .lock()
                .push(plan.header_str("X-Env").unwrap_or_default().to_string());
            Ok(ExchangeResult::new(
                plan.method().clone(),
                plan.uri().clone(),
                StatusCode::OK,
            ))
        }))
        .with_default_header("X-Env", "test");

        harness.get("/a").run().unwrap();
        harness.get("/b").header("X-Env", "override").run().unwrap();

        assert_eq!(seen.lock().as_slice(), ["test", "override"]);
    }

    #[test]
    fn test_base_path_prefixes_template() {
        let config = HarnessConfig {
            base_path: Some("/api/v1".to_string()),
            ..HarnessConfig::quiet()
        };
        let harness = Harness::with_config(EchoExecutor, config);
        let result = harness
            .get("/users/{id}")
            .var("7")
            .run()
            .unwrap();
        let json = result.json_value().unwrap();
        assert_eq!(json["path"], "/api/v1/users/7");
    }

    #[test]
    fn test_configuration_error_surfaces_before_execution() {
        let executed = Arc::new(AtomicUsize::new(0));
        let executed_probe = Arc::clone(&executed);
        let harness = Harness::new(FnExecutor::new(move |plan: ConstructionPlan| {
            executed_probe.fetch_add(1, Ordering::SeqCst);
            Ok(ExchangeResult::new(
                plan.method().clone(),
                plan.uri().clone(),
                StatusCode::OK,
            ))
        }));

        let error = harness.get("/person/{name}").run().unwrap_err();
        assert!(error.is_configuration());
        assert_eq!(executed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_custom_closure_matcher_and_handler() {
        let observed = Arc::new(AtomicUsize::new(0));
        let observed_probe = Arc::clone(&observed);

        let harness = Harness::echo();
        harness
            .get("/anything")
            .inspect(move |_result: &ExchangeResult| {
                observed_probe.fetch_add(1, Ordering::SeqCst);
            })
            .expect(|result: &ExchangeResult| {
                if result.status_code() < 500 {
                    Ok(())
                } else {
                    Err(AssertionFailure::new("server blew up"))
                }
            })
            .run()
            .unwrap();

        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_perform_then_verify_separately() {
        let harness = Harness::echo();
        let exchange = harness
            .get("/split")
            .expect(status().is_ok())
            .perform()
            .unwrap();
        assert_eq!(exchange.result().status_code(), 200);
        let result = exchange.verify().unwrap();
        assert_eq!(result.status_code(), 200);
    }

    #[test]
    fn test_fresh_plans_between_calls() {
        let harness = Harness::echo();
        harness.get("/one").header("X-Token", "abc").run().unwrap();

        let captured = Arc::new(parking_lot::Mutex::new(None));
        let captured_probe = Arc::clone(&captured);
        let probe = Harness::new(FnExecutor::new(move |plan: ConstructionPlan| {
            *captured_probe.lock() = Some(plan.headers().contains_key("X-Token"));
            Ok(ExchangeResult::new(
                plan.method().clone(),
                plan.uri().clone(),
                StatusCode::OK,
            ))
        }));
        probe.get("/two").run().unwrap();
        assert_eq!(*captured.lock(), Some(false));
    }

    #[test]
    fn test_header_matcher_against_executor_response() {
        let harness = Harness::new(FnExecutor::new(|plan: ConstructionPlan| {
            Ok(ExchangeResult::new(
                plan.method().clone(),
                plan.uri().clone(),
                StatusCode::OK,
            )
            .with_header("x-request-id", "42"))
        }));
        harness
            .get("/traced")
            .expect(header().string("x-request-id", "42"))
            .run()
            .unwrap();
    }
}
