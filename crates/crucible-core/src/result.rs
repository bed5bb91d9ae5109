//! Exchange results.
//!
//! An [`ExchangeResult`] is the opaque outcome handle an executor returns for
//! a dispatched plan. The executor owns and populates it; the verifier side
//! of the harness only ever reads it.

use crate::plan::Cookie;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Metadata about the handler an executor bound the request to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMetadata {
    name: String,
    operation: Option<String>,
}

impl HandlerMetadata {
    /// Creates handler metadata with a handler name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: None,
        }
    }

    /// Attaches an operation identifier.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Returns the handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the operation identifier, if any.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

/// The outcome of one executed plan.
///
/// Populated by the executor through the `with_*` methods, then handed to
/// the harness which drains its verification list against the read accessors.
#[must_use]
pub struct ExchangeResult {
    method: Method,
    uri: Uri,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    handler: Option<HandlerMetadata>,
    session: IndexMap<String, Value>,
    model: IndexMap<String, Value>,
    flash: IndexMap<String, Value>,
    view_name: Option<String>,
    forwarded_url: Option<String>,
    redirected_url: Option<String>,
}

impl ExchangeResult {
    /// Creates a result for the given dispatched method/URI with a status.
    pub fn new(method: Method, uri: Uri, status: StatusCode) -> Self {
        Self {
            method,
            uri,
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            handler: None,
            session: IndexMap::new(),
            model: IndexMap::new(),
            flash: IndexMap::new(),
            view_name: None,
            forwarded_url: None,
            redirected_url: None,
        }
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref()).expect("valid header name");
        let value = HeaderValue::try_from(value.as_ref()).expect("valid header value");
        self.headers.append(name, value);
        self
    }

    /// Replaces the response headers wholesale.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the response body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Records which handler the executor bound the request to.
    pub fn with_handler(mut self, handler: HandlerMetadata) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Records a session attribute left behind by the exchange.
    pub fn with_session_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session.insert(name.into(), value.into());
        self
    }

    /// Records a model attribute produced by the exchange.
    pub fn with_model_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.model.insert(name.into(), value.into());
        self
    }

    /// Records an outgoing flash attribute.
    pub fn with_flash_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.flash.insert(name.into(), value.into());
        self
    }

    /// Records the resolved view name.
    pub fn with_view_name(mut self, name: impl Into<String>) -> Self {
        self.view_name = Some(name.into());
        self
    }

    /// Records the URL the request was forwarded to.
    pub fn with_forwarded_url(mut self, url: impl Into<String>) -> Self {
        self.forwarded_url = Some(url.into());
        self
    }

    /// Records the URL the response redirects to.
    pub fn with_redirected_url(mut self, url: impl Into<String>) -> Self {
        self.redirected_url = Some(url.into());
        self
    }

    /// Returns the dispatched HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the dispatched URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response status as a bare number.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the response body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Deserializes the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Deserializes the response body as a JSON value.
    pub fn json_value(&self) -> Result<Value, serde_json::Error> {
        self.json()
    }

    /// Returns the cookies set by the response, parsed from `Set-Cookie`.
    #[must_use]
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|raw| {
                let pair = raw.split(';').next()?;
                let (name, value) = pair.split_once('=')?;
                Some(Cookie::new(name.trim(), value.trim()))
            })
            .collect()
    }

    /// Returns the handler metadata, if the executor recorded any.
    #[must_use]
    pub const fn handler(&self) -> Option<&HandlerMetadata> {
        self.handler.as_ref()
    }

    /// Returns the session state left behind by the exchange.
    #[must_use]
    pub const fn session(&self) -> &IndexMap<String, Value> {
        &self.session
    }

    /// Returns the model state produced by the exchange.
    #[must_use]
    pub const fn model(&self) -> &IndexMap<String, Value> {
        &self.model
    }

    /// Returns the outgoing flash attributes.
    #[must_use]
    pub const fn flash(&self) -> &IndexMap<String, Value> {
        &self.flash
    }

    /// Returns the resolved view name, if any.
    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        self.view_name.as_deref()
    }

    /// Returns the forwarded URL, if any.
    #[must_use]
    pub fn forwarded_url(&self) -> Option<&str> {
        self.forwarded_url.as_deref()
    }

    /// Returns the redirect target.
    ///
    /// Falls back to the `Location` header when the executor recorded no
    /// explicit redirect URL and the status is a redirection.
    #[must_use]
    pub fn redirected_url(&self) -> Option<&str> {
        if self.redirected_url.is_some() {
            return self.redirected_url.as_deref();
        }
        if self.status.is_redirection() {
            return self.header_str(header::LOCATION.as_str());
        }
        None
    }
}

impl fmt::Debug for ExchangeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeResult")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_result(status: u16, body: &str) -> ExchangeResult {
        ExchangeResult::new(
            Method::GET,
            Uri::from_static("/person/Lee"),
            StatusCode::from_u16(status).unwrap(),
        )
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
    }

    #[test]
    fn test_status_accessors() {
        let result = json_result(200, "{}");
        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(result.status_code(), 200);
    }

    #[test]
    fn test_body_text_and_json() {
        let result = json_result(200, "{\"name\":\"Lee\"}");
        assert_eq!(result.text().unwrap(), "{\"name\":\"Lee\"}");
        let value = result.json_value().unwrap();
        assert_eq!(value, json!({"name": "Lee"}));
    }

    #[test]
    fn test_cookie_parsing() {
        let result = json_result(200, "{}")
            .with_header("set-cookie", "session=abc123; Path=/; HttpOnly")
            .with_header("set-cookie", "theme=dark");
        let cookies = result.cookies();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0], Cookie::new("session", "abc123"));
        assert_eq!(cookies[1], Cookie::new("theme", "dark"));
    }

    #[test]
    fn test_redirected_url_from_location_header() {
        let result = ExchangeResult::new(
            Method::POST,
            Uri::from_static("/login"),
            StatusCode::FOUND,
        )
        .with_header("location", "/home");
        assert_eq!(result.redirected_url(), Some("/home"));
    }

    #[test]
    fn test_explicit_redirect_wins_over_location() {
        let result = ExchangeResult::new(
            Method::POST,
            Uri::from_static("/login"),
            StatusCode::FOUND,
        )
        .with_header("location", "/header")
        .with_redirected_url("/explicit");
        assert_eq!(result.redirected_url(), Some("/explicit"));
    }

    #[test]
    fn test_no_redirect_on_success_status() {
        let result = json_result(200, "{}").with_header("location", "/ignored");
        assert_eq!(result.redirected_url(), None);
    }

    #[test]
    fn test_state_maps() {
        let result = json_result(200, "{}")
            .with_session_attr("user", "alice")
            .with_model_attr("count", 3)
            .with_flash_attr("notice", "saved")
            .with_view_name("person/detail")
            .with_handler(HandlerMetadata::new("PersonController").with_operation("getPerson"));

        assert_eq!(result.session()["user"], "alice");
        assert_eq!(result.model()["count"], 3);
        assert_eq!(result.flash()["notice"], "saved");
        assert_eq!(result.view_name(), Some("person/detail"));
        let handler = result.handler().unwrap();
        assert_eq!(handler.name(), "PersonController");
        assert_eq!(handler.operation(), Some("getPerson"));
    }
}
