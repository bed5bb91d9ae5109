//! End-to-end pipeline integration tests.
//!
//! These tests drive the full build → execute → verify chain against a
//! scripted executor standing in for a small person service, covering:
//!
//! - plan construction with templates, headers, bodies, and attributes
//! - matcher evaluation order and fail-fast behavior
//! - handler side effects interleaved with matchers
//! - redirect and cookie verification
//! - registration sugar over the in-memory registry

use crucible::prelude::*;
use http::StatusCode;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::io;
use std::sync::Arc;

#[derive(Serialize)]
struct PersonForm {
    name: String,
}

/// Scripted executor emulating a person service.
struct PersonService;

impl Executor for PersonService {
    fn execute(&self, plan: ConstructionPlan) -> Result<ExchangeResult, ExecutorError> {
        let path = plan.uri().path().to_string();
        match (plan.method().as_str(), path.as_str()) {
            ("GET", p) if p.starts_with("/person/") => {
                let name = p.trim_start_matches("/person/").to_string();
                Ok(ExchangeResult::new(
                    plan.method().clone(),
                    plan.uri().clone(),
                    StatusCode::OK,
                )
                .with_header("content-type", "application/json;charset=UTF-8")
                .with_body(format!("{{\"name\":\"{name}\"}}"))
                .with_handler(
                    HandlerMetadata::new("PersonController").with_operation("getPerson"),
                )
                .with_model_attr("name", name))
            }
            ("POST", "/person") => {
                if plan.content_type() == Some("application/json") {
                    Ok(ExchangeResult::new(
                        plan.method().clone(),
                        plan.uri().clone(),
                        StatusCode::CREATED,
                    )
                    .with_header("location", "/person/foo")
                    .with_session_attr("lastCreated", "foo")
                    .with_flash_attr("notice", "person created"))
                } else {
                    Ok(ExchangeResult::new(
                        plan.method().clone(),
                        plan.uri().clone(),
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    ))
                }
            }
            ("POST", "/login") => Ok(ExchangeResult::new(
                plan.method().clone(),
                plan.uri().clone(),
                StatusCode::FOUND,
            )
            .with_header("set-cookie", "session=s3cr3t; Path=/; HttpOnly")
            .with_redirected_url("/home")),
            _ => Ok(ExchangeResult::new(
                plan.method().clone(),
                plan.uri().clone(),
                StatusCode::NOT_FOUND,
            )),
        }
    }
}

fn person_harness() -> Harness<PersonService> {
    Harness::with_config(PersonService, HarnessConfig::quiet())
}

#[test]
fn json_flow_with_stacked_matchers() {
    person_harness()
        .get("/person/{name}")
        .var("Lee")
        .secure(true)
        .accept("application/json")
        .principal(Principal::new("foo"))
        .expect(status().is_ok())
        .expect(content().content_type("application/json;charset=UTF-8"))
        .expect(json_path("$.name").value("Lee"))
        .expect(content().json(json!({"name": "Lee"})))
        .expect(model().attribute("name", "Lee"))
        .run()
        .unwrap();
}

#[test]
fn post_with_json_body_is_created() {
    person_harness()
        .post("/person")
        .json(&PersonForm {
            name: "foo".into(),
        })
        .expect(status().is_created())
        .expect(session().attribute("lastCreated", "foo"))
        .expect(flash().attribute("notice", "person created"))
        .run()
        .unwrap();
}

#[test]
fn post_without_content_type_is_rejected_by_service() {
    person_harness()
        .post("/person")
        .text("{ \"name\": \"foo\" }")
        .expect(status().is(415))
        .run()
        .unwrap();
}

#[test]
fn matchers_raise_on_mismatch() {
    let harness = person_harness();

    let error = harness
        .get("/person/Petr")
        .expect(content().content_type("application/atom+xml"))
        .run()
        .unwrap_err();
    assert!(error.is_assertion());

    let error = harness
        .get("/person/Petr")
        .expect(content().string("Wrong"))
        .run()
        .unwrap_err();
    assert!(error.is_assertion());

    let error = harness
        .get("/person/Petr")
        .expect(json_path("$.name").value("Wrong"))
        .run()
        .unwrap_err();
    assert!(error.is_assertion());

    let error = harness
        .get("/person/Petr")
        .expect(header().string("x-missing", "wrong"))
        .run()
        .unwrap_err();
    assert!(error.is_assertion());

    let error = harness
        .get("/person/Petr")
        .expect(view().name("wrongName"))
        .run()
        .unwrap_err();
    assert!(error.is_assertion());

    let error = harness
        .get("/person/Petr")
        .expect(status().is_accepted())
        .run()
        .unwrap_err();
    assert!(error.to_string().contains("expected 202, got 200"));
}

#[test]
fn first_failing_matcher_halts_the_rest() {
    let reached = Arc::new(Mutex::new(false));
    let reached_probe = Arc::clone(&reached);

    let error = person_harness()
        .get("/nowhere")
        .expect(status().is_ok())
        .expect(move |_result: &ExchangeResult| -> Result<(), AssertionFailure> {
            *reached_probe.lock() = true;
            Ok(())
        })
        .run()
        .unwrap_err();

    assert!(error.to_string().contains("expected 200, got 404"));
    assert!(!*reached.lock(), "matcher after the failure must not run");
}

/// Writer handing its bytes back out through a shared buffer.
#[derive(Clone)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn handlers_before_failure_run_after_do_not() {
    let before = Arc::new(Mutex::new(Vec::new()));
    let after = Arc::new(Mutex::new(Vec::new()));

    let error = person_harness()
        .get("/person/Lee")
        .inspect(print().to_writer(SharedBuf(Arc::clone(&before))).unwrap())
        .expect(status().is_bad_request())
        .inspect(print().to_writer(SharedBuf(Arc::clone(&after))).unwrap())
        .run()
        .unwrap_err();

    assert!(error.is_assertion());
    let printed = String::from_utf8(before.lock().clone()).unwrap();
    assert!(printed.contains("Request: GET /person/Lee"));
    assert!(printed.contains("Handler: PersonController (getPerson)"));
    assert!(after.lock().is_empty(), "handler after the failure must not run");
}

#[test]
fn login_redirect_and_cookie() {
    person_harness()
        .post("/login")
        .form(&json!({"user": "alice", "password": "pw"}))
        .expect(status().is_redirection())
        .expect(redirected_url("/home"))
        .expect(redirected_url_pattern("/h*"))
        .expect(cookie().value("session", "s3cr3t"))
        .run()
        .unwrap();
}

#[test]
fn verified_result_is_handed_back() {
    let result = person_harness()
        .get("/person/{name}")
        .var("Clint")
        .expect(status().is_ok())
        .run()
        .unwrap();

    assert_eq!(result.status_code(), 200);
    assert_eq!(result.json_value().unwrap()["name"], "Clint");
    assert_eq!(result.handler().unwrap().name(), "PersonController");
}

#[test]
fn log_handler_is_best_effort() {
    // No subscriber may be installed; the handler must still be a no-op
    // rather than a failure.
    person_harness()
        .get("/person/Lee")
        .log()
        .expect(status().is_ok())
        .run()
        .unwrap();
}

#[test]
fn registrar_backs_test_fixtures() {
    struct FixtureClock {
        now: &'static str,
    }

    let mut registry = MapRegistry::new();
    let mut registrar = Registrar::new(&mut registry);

    let clock_name = registrar
        .register::<FixtureClock>()
        .named("clock")
        .description("frozen clock for deterministic tests")
        .with(|| FixtureClock {
            now: "2024-01-01T00:00:00Z",
        })
        .unwrap();
    let generated = registrar
        .register::<FixtureClock>()
        .with(|| FixtureClock { now: "later" })
        .unwrap();

    assert_eq!(clock_name, "clock");
    assert_eq!(generated, "fixtureClock");

    let clock: FixtureClock = registry.instantiate("clock").unwrap();
    assert_eq!(clock.now, "2024-01-01T00:00:00Z");
}
