//! Matcher factories for exchange results.
//!
//! Each factory opens a small namespace of assertions over one facet of the
//! result; every method returns a matcher ready to be registered with
//! `expect`. Matchers only ever read the result.
//!
//! ```
//! use crucible_harness::matchers::{content, json_path, status};
//! use crucible_harness::Harness;
//!
//! let harness = Harness::echo();
//! harness
//!     .get("/person/{name}")
//!     .var("Lee")
//!     .expect(status().is_ok())
//!     .expect(content().content_type("application/json"))
//!     .expect(json_path("$.path").value("/person/Lee"))
//!     .run()
//!     .unwrap();
//! ```

use crate::exchange::ResultMatcher;
use crucible_core::error::AssertionFailure;
use crucible_core::result::ExchangeResult;
use regex::Regex;
use serde_json::Value;

/// Opens the status assertion namespace.
#[must_use]
pub const fn status() -> StatusMatchers {
    StatusMatchers
}

/// Assertions over the response status.
#[must_use]
pub struct StatusMatchers;

impl StatusMatchers {
    /// Asserts an exact status code.
    pub fn is(self, expected: u16) -> impl ResultMatcher {
        move |result: &ExchangeResult| {
            if result.status_code() == expected {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch(
                    "status",
                    expected,
                    result.status_code(),
                ))
            }
        }
    }

    /// Asserts status 200.
    pub fn is_ok(self) -> impl ResultMatcher {
        self.is(200)
    }

    /// Asserts status 201.
    pub fn is_created(self) -> impl ResultMatcher {
        self.is(201)
    }

    /// Asserts status 202.
    pub fn is_accepted(self) -> impl ResultMatcher {
        self.is(202)
    }

    /// Asserts status 204.
    pub fn is_no_content(self) -> impl ResultMatcher {
        self.is(204)
    }

    /// Asserts status 400.
    pub fn is_bad_request(self) -> impl ResultMatcher {
        self.is(400)
    }

    /// Asserts status 401.
    pub fn is_unauthorized(self) -> impl ResultMatcher {
        self.is(401)
    }

    /// Asserts status 403.
    pub fn is_forbidden(self) -> impl ResultMatcher {
        self.is(403)
    }

    /// Asserts status 404.
    pub fn is_not_found(self) -> impl ResultMatcher {
        self.is(404)
    }

    /// Asserts a 2xx status.
    pub fn is_success(self) -> impl ResultMatcher {
        Self::class("2xx", |s| (200..300).contains(&s))
    }

    /// Asserts a 3xx status.
    pub fn is_redirection(self) -> impl ResultMatcher {
        Self::class("3xx", |s| (300..400).contains(&s))
    }

    /// Asserts a 4xx status.
    pub fn is_client_error(self) -> impl ResultMatcher {
        Self::class("4xx", |s| (400..500).contains(&s))
    }

    /// Asserts a 5xx status.
    pub fn is_server_error(self) -> impl ResultMatcher {
        Self::class("5xx", |s| (500..600).contains(&s))
    }

    fn class(label: &'static str, accepts: fn(u16) -> bool) -> impl ResultMatcher {
        move |result: &ExchangeResult| {
            if accepts(result.status_code()) {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch(
                    "status class",
                    label,
                    result.status_code(),
                ))
            }
        }
    }
}

/// Opens the header assertion namespace.
#[must_use]
pub const fn header() -> HeaderMatchers {
    HeaderMatchers
}

/// Assertions over response headers.
#[must_use]
pub struct HeaderMatchers;

impl HeaderMatchers {
    /// Asserts a header carries exactly the given value.
    pub fn string(
        self,
        name: impl Into<String>,
        expected: impl Into<String>,
    ) -> impl ResultMatcher {
        let name = name.into();
        let expected = expected.into();
        move |result: &ExchangeResult| match result.header_str(&name) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(AssertionFailure::mismatch(
                &format!("header `{name}`"),
                &expected,
                actual,
            )),
            None => Err(AssertionFailure::new(format!("header `{name}` not found"))),
        }
    }

    /// Asserts a header carries exactly the given values, in order.
    pub fn string_values<I, S>(self, name: impl Into<String>, expected: I) -> impl ResultMatcher
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let expected: Vec<String> = expected.into_iter().map(Into::into).collect();
        move |result: &ExchangeResult| {
            let actual: Vec<&str> = result
                .headers()
                .get_all(name.as_str())
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            if actual == expected {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch(
                    &format!("header `{name}` values"),
                    format!("{expected:?}"),
                    format!("{actual:?}"),
                ))
            }
        }
    }

    /// Asserts a header is present.
    pub fn exists(self, name: impl Into<String>) -> impl ResultMatcher {
        let name = name.into();
        move |result: &ExchangeResult| {
            if result.headers().contains_key(name.as_str()) {
                Ok(())
            } else {
                Err(AssertionFailure::new(format!("header `{name}` not found")))
            }
        }
    }

    /// Asserts a header is absent.
    pub fn does_not_exist(self, name: impl Into<String>) -> impl ResultMatcher {
        let name = name.into();
        move |result: &ExchangeResult| {
            if result.headers().contains_key(name.as_str()) {
                Err(AssertionFailure::new(format!(
                    "header `{name}` unexpectedly present"
                )))
            } else {
                Ok(())
            }
        }
    }
}

/// Opens the body/content assertion namespace.
#[must_use]
pub const fn content() -> ContentMatchers {
    ContentMatchers
}

/// Assertions over the response body and content type.
#[must_use]
pub struct ContentMatchers;

impl ContentMatchers {
    /// Asserts the Content-Type header, ignoring trailing parameters.
    pub fn content_type(self, expected: impl Into<String>) -> impl ResultMatcher {
        let expected = expected.into();
        move |result: &ExchangeResult| match result.content_type() {
            Some(actual) if actual == expected || actual.starts_with(&expected) => Ok(()),
            Some(actual) => Err(AssertionFailure::mismatch(
                "content type",
                &expected,
                actual,
            )),
            None => Err(AssertionFailure::new("content type not set")),
        }
    }

    /// Asserts the body equals the given string.
    pub fn string(self, expected: impl Into<String>) -> impl ResultMatcher {
        let expected = expected.into();
        move |result: &ExchangeResult| {
            let actual = body_text(result)?;
            if actual == expected {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch("body", &expected, actual))
            }
        }
    }

    /// Asserts the body contains the given substring.
    pub fn contains(self, expected: impl Into<String>) -> impl ResultMatcher {
        let expected = expected.into();
        move |result: &ExchangeResult| {
            let actual = body_text(result)?;
            if actual.contains(expected.as_str()) {
                Ok(())
            } else {
                Err(AssertionFailure::new(format!(
                    "body does not contain `{expected}`, got: {actual}"
                )))
            }
        }
    }

    /// Asserts the raw body bytes.
    pub fn bytes(self, expected: impl Into<Vec<u8>>) -> impl ResultMatcher {
        let expected = expected.into();
        move |result: &ExchangeResult| {
            if result.body().as_ref() == expected.as_slice() {
                Ok(())
            } else {
                Err(AssertionFailure::new(format!(
                    "body bytes differ: expected {} bytes, got {} bytes",
                    expected.len(),
                    result.body().len()
                )))
            }
        }
    }

    /// Asserts the body is JSON containing at least the expected structure.
    ///
    /// Objects may carry extra keys; arrays must match in length and order.
    pub fn json(self, expected: Value) -> impl ResultMatcher {
        move |result: &ExchangeResult| {
            let actual = body_json(result)?;
            if json_subset(&expected, &actual) {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch("json body", &expected, actual))
            }
        }
    }

    /// Asserts the body is JSON exactly equal to the expected value.
    pub fn json_strict(self, expected: Value) -> impl ResultMatcher {
        move |result: &ExchangeResult| {
            let actual = body_json(result)?;
            if actual == expected {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch("json body", &expected, actual))
            }
        }
    }
}

/// Opens the JSON path assertion namespace for one expression.
///
/// Supported expressions are dotted paths with optional array indices, with
/// or without a leading `$`: `$.items[0].name`, `user.tags.1`.
#[must_use]
pub fn json_path(expression: impl Into<String>) -> JsonPathMatchers {
    JsonPathMatchers {
        expression: expression.into(),
    }
}

/// Assertions over one JSON path of the response body.
#[must_use]
pub struct JsonPathMatchers {
    expression: String,
}

impl JsonPathMatchers {
    /// Asserts the path resolves to the given value.
    pub fn value(self, expected: impl Into<Value>) -> impl ResultMatcher {
        let expected = expected.into();
        move |result: &ExchangeResult| {
            let actual = self.resolve(result)?;
            if actual == expected {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch(
                    &format!("json path `{}`", self.expression),
                    &expected,
                    actual,
                ))
            }
        }
    }

    /// Asserts the path resolves to some value.
    pub fn exists(self) -> impl ResultMatcher {
        move |result: &ExchangeResult| self.resolve(result).map(|_| ())
    }

    /// Asserts the path resolves to nothing.
    pub fn does_not_exist(self) -> impl ResultMatcher {
        move |result: &ExchangeResult| {
            let root = body_json(result)?;
            match lookup(&root, &self.expression) {
                Some(found) => Err(AssertionFailure::new(format!(
                    "json path `{}` unexpectedly present: {found}",
                    self.expression
                ))),
                None => Ok(()),
            }
        }
    }

    /// Asserts the path resolves to a string.
    pub fn is_string(self) -> impl ResultMatcher {
        self.of_kind("string", Value::is_string)
    }

    /// Asserts the path resolves to a number.
    pub fn is_number(self) -> impl ResultMatcher {
        self.of_kind("number", Value::is_number)
    }

    /// Asserts the path resolves to a boolean.
    pub fn is_boolean(self) -> impl ResultMatcher {
        self.of_kind("boolean", Value::is_boolean)
    }

    /// Asserts the path resolves to an array.
    pub fn is_array(self) -> impl ResultMatcher {
        self.of_kind("array", Value::is_array)
    }

    fn of_kind(self, kind: &'static str, accepts: fn(&Value) -> bool) -> impl ResultMatcher {
        move |result: &ExchangeResult| {
            let actual = self.resolve(result)?;
            if accepts(&actual) {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch(
                    &format!("json path `{}`", self.expression),
                    kind,
                    actual,
                ))
            }
        }
    }

    fn resolve(&self, result: &ExchangeResult) -> Result<Value, AssertionFailure> {
        let root = body_json(result)?;
        lookup(&root, &self.expression).cloned().ok_or_else(|| {
            AssertionFailure::new(format!("json path `{}` not found", self.expression))
        })
    }
}

/// Opens the cookie assertion namespace.
#[must_use]
pub const fn cookie() -> CookieMatchers {
    CookieMatchers
}

/// Assertions over response cookies.
#[must_use]
pub struct CookieMatchers;

impl CookieMatchers {
    /// Asserts a response cookie carries the given value.
    pub fn value(
        self,
        name: impl Into<String>,
        expected: impl Into<String>,
    ) -> impl ResultMatcher {
        let name = name.into();
        let expected = expected.into();
        move |result: &ExchangeResult| {
            let cookies = result.cookies();
            match cookies.iter().find(|c| c.name == name) {
                Some(cookie) if cookie.value == expected => Ok(()),
                Some(cookie) => Err(AssertionFailure::mismatch(
                    &format!("cookie `{name}`"),
                    &expected,
                    &cookie.value,
                )),
                None => Err(AssertionFailure::new(format!("cookie `{name}` not set"))),
            }
        }
    }

    /// Asserts a response cookie exists.
    pub fn exists(self, name: impl Into<String>) -> impl ResultMatcher {
        let name = name.into();
        move |result: &ExchangeResult| {
            if result.cookies().iter().any(|c| c.name == name) {
                Ok(())
            } else {
                Err(AssertionFailure::new(format!("cookie `{name}` not set")))
            }
        }
    }

    /// Asserts a response cookie is absent.
    pub fn does_not_exist(self, name: impl Into<String>) -> impl ResultMatcher {
        let name = name.into();
        move |result: &ExchangeResult| {
            if result.cookies().iter().any(|c| c.name == name) {
                Err(AssertionFailure::new(format!(
                    "cookie `{name}` unexpectedly set"
                )))
            } else {
                Ok(())
            }
        }
    }
}

/// Opens the view assertion namespace.
#[must_use]
pub const fn view() -> ViewMatchers {
    ViewMatchers
}

/// Assertions over the resolved view.
#[must_use]
pub struct ViewMatchers;

impl ViewMatchers {
    /// Asserts the resolved view name.
    pub fn name(self, expected: impl Into<String>) -> impl ResultMatcher {
        let expected = expected.into();
        move |result: &ExchangeResult| match result.view_name() {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(AssertionFailure::mismatch("view name", &expected, actual)),
            None => Err(AssertionFailure::new("no view was resolved")),
        }
    }
}

/// Which state map of the result an [`AttributeMatchers`] reads.
#[derive(Clone, Copy)]
enum StateMap {
    Session,
    Model,
    Flash,
}

impl StateMap {
    const fn label(self) -> &'static str {
        match self {
            Self::Session => "session attribute",
            Self::Model => "model attribute",
            Self::Flash => "flash attribute",
        }
    }

    fn get(self, result: &ExchangeResult) -> &indexmap::IndexMap<String, Value> {
        match self {
            Self::Session => result.session(),
            Self::Model => result.model(),
            Self::Flash => result.flash(),
        }
    }
}

/// Opens the session-state assertion namespace.
#[must_use]
pub const fn session() -> AttributeMatchers {
    AttributeMatchers {
        map: StateMap::Session,
    }
}

/// Opens the model-state assertion namespace.
#[must_use]
pub const fn model() -> AttributeMatchers {
    AttributeMatchers {
        map: StateMap::Model,
    }
}

/// Opens the flash-attribute assertion namespace.
#[must_use]
pub const fn flash() -> AttributeMatchers {
    AttributeMatchers {
        map: StateMap::Flash,
    }
}

/// Assertions over one of the result's state maps.
#[must_use]
pub struct AttributeMatchers {
    map: StateMap,
}

impl AttributeMatchers {
    /// Asserts an attribute carries the given value.
    pub fn attribute(
        self,
        name: impl Into<String>,
        expected: impl Into<Value>,
    ) -> impl ResultMatcher {
        let name = name.into();
        let expected = expected.into();
        move |result: &ExchangeResult| match self.map.get(result).get(&name) {
            Some(actual) if actual == &expected => Ok(()),
            Some(actual) => Err(AssertionFailure::mismatch(
                &format!("{} `{name}`", self.map.label()),
                &expected,
                actual,
            )),
            None => Err(AssertionFailure::new(format!(
                "{} `{name}` not found",
                self.map.label()
            ))),
        }
    }

    /// Asserts every named attribute exists.
    pub fn attribute_exists<I, S>(self, names: I) -> impl ResultMatcher
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        move |result: &ExchangeResult| {
            let map = self.map.get(result);
            for name in &names {
                if !map.contains_key(name) {
                    return Err(AssertionFailure::new(format!(
                        "{} `{name}` not found",
                        self.map.label()
                    )));
                }
            }
            Ok(())
        }
    }

    /// Asserts the number of attributes in the map.
    pub fn size(self, expected: usize) -> impl ResultMatcher {
        move |result: &ExchangeResult| {
            let actual = self.map.get(result).len();
            if actual == expected {
                Ok(())
            } else {
                Err(AssertionFailure::mismatch(
                    &format!("{} count", self.map.label()),
                    expected,
                    actual,
                ))
            }
        }
    }
}

/// Asserts the exact redirect target.
#[must_use]
pub fn redirected_url(expected: impl Into<String>) -> impl ResultMatcher {
    let expected = expected.into();
    move |result: &ExchangeResult| match result.redirected_url() {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(AssertionFailure::mismatch(
            "redirected URL",
            &expected,
            actual,
        )),
        None => Err(AssertionFailure::new("no redirect was issued")),
    }
}

/// Asserts the redirect target against a glob pattern (`*` within a segment,
/// `**` across segments).
#[must_use]
pub fn redirected_url_pattern(pattern: impl AsRef<str>) -> impl ResultMatcher {
    let regex = glob_to_regex(pattern.as_ref());
    let pattern = pattern.as_ref().to_string();
    move |result: &ExchangeResult| match result.redirected_url() {
        Some(actual) if regex.is_match(actual) => Ok(()),
        Some(actual) => Err(AssertionFailure::mismatch(
            "redirected URL",
            &pattern,
            actual,
        )),
        None => Err(AssertionFailure::new("no redirect was issued")),
    }
}

/// Asserts the exact forwarded URL.
#[must_use]
pub fn forwarded_url(expected: impl Into<String>) -> impl ResultMatcher {
    let expected = expected.into();
    move |result: &ExchangeResult| match result.forwarded_url() {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(AssertionFailure::mismatch(
            "forwarded URL",
            &expected,
            actual,
        )),
        None => Err(AssertionFailure::new("no forward was issued")),
    }
}

/// Asserts the forwarded URL against a glob pattern.
#[must_use]
pub fn forwarded_url_pattern(pattern: impl AsRef<str>) -> impl ResultMatcher {
    let regex = glob_to_regex(pattern.as_ref());
    let pattern = pattern.as_ref().to_string();
    move |result: &ExchangeResult| match result.forwarded_url() {
        Some(actual) if regex.is_match(actual) => Ok(()),
        Some(actual) => Err(AssertionFailure::mismatch(
            "forwarded URL",
            &pattern,
            actual,
        )),
        None => Err(AssertionFailure::new("no forward was issued")),
    }
}

fn body_text(result: &ExchangeResult) -> Result<&str, AssertionFailure> {
    result
        .text()
        .map_err(|e| AssertionFailure::new(format!("body is not valid UTF-8: {e}")))
}

fn body_json(result: &ExchangeResult) -> Result<Value, AssertionFailure> {
    result
        .json_value()
        .map_err(|e| AssertionFailure::new(format!("body is not valid JSON: {e}")))
}

/// Returns `true` when `expected` is structurally contained in `actual`.
fn json_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => e
            .iter()
            .all(|(k, ev)| a.get(k).is_some_and(|av| json_subset(ev, av))),
        (Value::Array(e), Value::Array(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(ev, av)| json_subset(ev, av))
        }
        _ => expected == actual,
    }
}

/// Resolves a dotted/indexed path against a JSON value.
fn lookup<'a>(root: &'a Value, expression: &str) -> Option<&'a Value> {
    let path = expression.strip_prefix('$').unwrap_or(expression);
    let mut current = root;
    for raw in path.split('.') {
        if raw.is_empty() {
            continue;
        }
        let mut segment = raw;
        while let Some(open) = segment.find('[') {
            let name = &segment[..open];
            if !name.is_empty() {
                current = step(current, name)?;
            }
            let rest = &segment[open + 1..];
            let close = rest.find(']')?;
            let index: usize = rest[..close].parse().ok()?;
            current = current.get(index)?;
            segment = &rest[close + 1..];
        }
        if !segment.is_empty() {
            current = step(current, segment)?;
        }
    }
    Some(current)
}

/// One path step: a field name, or an array index written without brackets.
fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    segment
        .parse::<usize>()
        .ok()
        .and_then(|index| current.get(index))
        .or_else(|| current.get(segment))
}

/// Compiles a URL glob into an anchored regex.
fn glob_to_regex(pattern: &str) -> Regex {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    regex.push_str(".*");
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    Regex::new(&regex).expect("valid glob-derived regex")
}
