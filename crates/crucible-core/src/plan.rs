//! Request construction plans.
//!
//! A [`RequestPlan`] accumulates request intent one facet at a time: method,
//! URL template with substitution variables, headers, parameters, body,
//! cookies, attribute bags, locales, the secure flag, and a principal. Every
//! facet is last-write-wins and nothing is validated locally beyond type
//! constraints; whether a combination of facets makes sense is the external
//! executor's concern.
//!
//! [`RequestPlan::finish`] consumes the builder exactly once and produces the
//! immutable [`ConstructionPlan`] handed to the executor.
//!
//! # Example
//!
//! ```
//! use crucible_core::plan::RequestPlan;
//!
//! let plan = RequestPlan::get("/person/{name}")
//!     .var("Lee")
//!     .header("Accept", "application/json")
//!     .secure(true)
//!     .finish()
//!     .unwrap();
//!
//! assert_eq!(plan.uri().path(), "/person/Lee");
//! assert!(plan.secure());
//! ```

use crate::error::ConfigurationError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// A request cookie as a plain name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl Cookie {
    /// Creates a cookie from a name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The authenticated principal attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
}

impl Principal {
    /// Creates a principal with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the principal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One part of a multipart request body.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    content: Bytes,
}

impl Part {
    /// Creates a plain text form field part.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            content: Bytes::from(value.into()),
        }
    }

    /// Creates a file upload part.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            content: content.into(),
        }
    }
}

/// A request body in one of its accepted shapes.
///
/// The text and binary setters on [`RequestPlan`] overwrite each other
/// silently; the last write is what reaches the executor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlanBody {
    /// No body.
    #[default]
    Empty,
    /// A UTF-8 string body.
    Text(String),
    /// A raw byte body.
    Binary(Bytes),
}

impl PlanBody {
    /// Returns the body as bytes, empty for [`PlanBody::Empty`].
    #[must_use]
    pub fn as_bytes(&self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Text(text) => Bytes::from(text.clone()),
            Self::Binary(bytes) => bytes.clone(),
        }
    }

    /// Returns `true` if no body has been set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Builder for a request construction plan.
///
/// Setters record intent and return `self`; each facet is last-write-wins.
/// Nothing is submitted anywhere until the plan is finished and handed to an
/// executor.
#[must_use]
#[derive(Debug, Clone)]
pub struct RequestPlan {
    method: Method,
    template: String,
    variables: Vec<String>,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: PlanBody,
    cookies: Vec<Cookie>,
    request_attrs: IndexMap<String, Value>,
    session_attrs: IndexMap<String, Value>,
    flash_attrs: IndexMap<String, Value>,
    locales: Vec<String>,
    secure: bool,
    principal: Option<Principal>,
}

impl RequestPlan {
    /// Creates a plan with the given method and URL template.
    pub fn request(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            variables: Vec::new(),
            headers: HeaderMap::new(),
            params: Vec::new(),
            body: PlanBody::Empty,
            cookies: Vec::new(),
            request_attrs: IndexMap::new(),
            session_attrs: IndexMap::new(),
            flash_attrs: IndexMap::new(),
            locales: Vec::new(),
            secure: false,
            principal: None,
        }
    }

    /// Creates a GET plan.
    pub fn get(template: impl Into<String>) -> Self {
        Self::request(Method::GET, template)
    }

    /// Creates a POST plan.
    pub fn post(template: impl Into<String>) -> Self {
        Self::request(Method::POST, template)
    }

    /// Creates a PUT plan.
    pub fn put(template: impl Into<String>) -> Self {
        Self::request(Method::PUT, template)
    }

    /// Creates a PATCH plan.
    pub fn patch(template: impl Into<String>) -> Self {
        Self::request(Method::PATCH, template)
    }

    /// Creates a DELETE plan.
    pub fn delete(template: impl Into<String>) -> Self {
        Self::request(Method::DELETE, template)
    }

    /// Creates an OPTIONS plan.
    pub fn options(template: impl Into<String>) -> Self {
        Self::request(Method::OPTIONS, template)
    }

    /// Creates a HEAD plan.
    pub fn head(template: impl Into<String>) -> Self {
        Self::request(Method::HEAD, template)
    }

    /// Appends one substitution variable for the URL template.
    ///
    /// Variables fill `{placeholder}` segments in declaration order and are
    /// percent-encoded when the template is expanded.
    pub fn var(mut self, value: impl Into<String>) -> Self {
        self.variables.push(value.into());
        self
    }

    /// Appends several substitution variables for the URL template.
    pub fn vars<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables.extend(values.into_iter().map(Into::into));
        self
    }

    /// Sets a header, replacing any previously set values for that name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref()).expect("valid header name");
        let value = HeaderValue::try_from(value.as_ref()).expect("valid header value");
        self.headers.insert(name, value);
        self
    }

    /// Sets a multi-valued header, replacing any previously set values.
    ///
    /// The given values are carried in order.
    pub fn header_values<I, S>(mut self, name: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = HeaderName::try_from(name.as_ref()).expect("valid header name");
        self.headers.remove(&name);
        for value in values {
            let value = HeaderValue::try_from(value.as_ref()).expect("valid header value");
            self.headers.append(name.clone(), value);
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Accept header.
    pub fn accept(self, accept: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT.as_str(), accept)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Appends a query/form parameter value.
    ///
    /// Parameters are multi-valued; repeated names accumulate in order.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Appends several query/form parameters.
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a raw byte body, replacing any body set before.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = PlanBody::Binary(body.into());
        self
    }

    /// Sets a string body, replacing any body set before.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = PlanBody::Text(body.into());
        self
    }

    /// Sets a JSON body and the matching Content-Type header.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        let body = serde_json::to_string(value).expect("JSON serialization should succeed");
        self.body = PlanBody::Text(body);
        self.content_type("application/json")
    }

    /// Sets a form-urlencoded body and the matching Content-Type header.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.body = PlanBody::Text(form_encode(value));
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Sets a multipart/form-data body from the given parts, replacing any
    /// body set before, and sets the matching Content-Type header with a
    /// generated boundary.
    pub fn parts<I>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = Part>,
    {
        let boundary = format!("crucible-{}", Uuid::now_v7().simple());
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match &part.file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name)
                        .as_bytes(),
                ),
            }
            if let Some(content_type) = &part.content_type {
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(&part.content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        self.body = PlanBody::Binary(Bytes::from(body));
        self.content_type(format!("multipart/form-data; boundary={boundary}"))
    }

    /// Appends a cookie.
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Appends several cookies.
    pub fn cookies<I>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = Cookie>,
    {
        self.cookies.extend(cookies);
        self
    }

    /// Appends a locale to the preference list, most preferred first.
    pub fn locale(mut self, tag: impl Into<String>) -> Self {
        self.locales.push(tag.into());
        self
    }

    /// Sets a request-scoped attribute; repeated names overwrite.
    pub fn request_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request_attrs.insert(name.into(), value.into());
        self
    }

    /// Sets a session attribute; repeated names overwrite.
    pub fn session_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session_attrs.insert(name.into(), value.into());
        self
    }

    /// Sets several session attributes.
    pub fn session_attrs<I, K>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.session_attrs
            .extend(attrs.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Sets a flash attribute; repeated names overwrite.
    pub fn flash_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.flash_attrs.insert(name.into(), value.into());
        self
    }

    /// Sets several flash attributes.
    pub fn flash_attrs<I, K>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.flash_attrs
            .extend(attrs.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Marks the plan as using a secure channel.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the authenticated principal.
    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Prefixes the URL template with a base path.
    ///
    /// Used by harness configuration; explicit templates already carrying the
    /// prefix are the caller's responsibility.
    pub fn prefixed(mut self, base_path: &str) -> Self {
        self.template = format!("{}{}", base_path, self.template);
        self
    }

    /// Finalizes the plan.
    ///
    /// Expands the URL template with the recorded substitution variables and
    /// freezes every facet into an immutable [`ConstructionPlan`]. A plan is
    /// finished exactly once; the builder is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when a template placeholder has no
    /// matching variable, the template is malformed, or the expanded URL is
    /// not a valid URI.
    pub fn finish(self) -> Result<ConstructionPlan, ConfigurationError> {
        let expanded = expand_template(&self.template, &self.variables)?;
        let uri: Uri = expanded
            .parse()
            .map_err(|e| ConfigurationError::new(format!("invalid URI `{expanded}`: {e}")))?;

        Ok(ConstructionPlan {
            method: self.method,
            uri,
            headers: self.headers,
            params: self.params,
            body: self.body,
            cookies: self.cookies,
            request_attrs: self.request_attrs,
            session_attrs: self.session_attrs,
            flash_attrs: self.flash_attrs,
            locales: self.locales,
            secure: self.secure,
            principal: self.principal,
        })
    }
}

/// A finalized, immutable description of a mock request.
///
/// Produced by [`RequestPlan::finish`] and owned by the executor from then
/// on. All accessors are read-only.
#[derive(Debug, Clone)]
pub struct ConstructionPlan {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: PlanBody,
    cookies: Vec<Cookie>,
    request_attrs: IndexMap<String, Value>,
    session_attrs: IndexMap<String, Value>,
    flash_attrs: IndexMap<String, Value>,
    locales: Vec<String>,
    secure: bool,
    principal: Option<Principal>,
}

impl ConstructionPlan {
    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the expanded request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
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

    /// Returns the query/form parameters in accumulation order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the request body.
    #[must_use]
    pub const fn body(&self) -> &PlanBody {
        &self.body
    }

    /// Returns the request cookies.
    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Returns the request-scoped attributes.
    #[must_use]
    pub const fn request_attrs(&self) -> &IndexMap<String, Value> {
        &self.request_attrs
    }

    /// Returns the session attributes.
    #[must_use]
    pub const fn session_attrs(&self) -> &IndexMap<String, Value> {
        &self.session_attrs
    }

    /// Returns the flash attributes.
    #[must_use]
    pub const fn flash_attrs(&self) -> &IndexMap<String, Value> {
        &self.flash_attrs
    }

    /// Returns the locale preference list, most preferred first.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// Returns `true` if the plan was marked secure.
    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    /// Returns the authenticated principal, if one was set.
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

/// Expands `{placeholder}` segments with positional variables.
///
/// Variables are consumed in order and percent-encoded. Surplus variables are
/// ignored; a placeholder without a variable is a configuration error.
fn expand_template(template: &str, variables: &[String]) -> Result<String, ConfigurationError> {
    let mut out = String::with_capacity(template.len());
    let mut values = variables.iter();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(ConfigurationError::new(format!(
                "unterminated template variable in `{template}`"
            )));
        };
        let name = &after[..close];
        let value = values.next().ok_or_else(|| {
            ConfigurationError::new(format!("no value for template variable `{{{name}}}`"))
        })?;
        out.push_str(&urlencoding::encode(value));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Encodes a serializable value as `application/x-www-form-urlencoded`.
///
/// The value must serialize to a JSON object; nested values are carried as
/// their JSON text.
fn form_encode<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_value(value).expect("form serialization should succeed");
    let Value::Object(map) = json else {
        panic!("form body must serialize to an object");
    };
    let pairs: Vec<String> = map
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            format!("{}={}", urlencoding::encode(&k), urlencoding::encode(&v))
        })
        .collect();
    pairs.join("&")
}
