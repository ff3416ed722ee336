//! Immutable HTTP request values.

use std::collections::HashMap;

use bytes::Bytes;

use super::{Headers, Method};

/// An immutable HTTP request.
///
/// A `Request` is a value: the `with_*` builders consume the receiver and
/// return a new value, so a shared request can never be observed mid-change.
/// Callers that need to keep the original clone it first; cloning is cheap
/// because the body is a [`Bytes`] buffer.
///
/// The attribute map carries per-request string data attached by earlier
/// pipeline stages, most notably path variables captured by the router.
///
/// # Examples
///
/// ```
/// use relay::Request;
///
/// let request = Request::new("GET", "/cats/42?fields=name");
/// assert_eq!(request.target(), "/cats/42?fields=name");
/// assert_eq!(request.path(), "/cats/42");
///
/// let tagged = request.clone().with_attribute("id", "42");
/// assert_eq!(tagged.attribute("id"), Some("42"));
/// assert!(request.attribute("id").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    target: String,
    headers: Headers,
    body: Bytes,
    attributes: HashMap<String, String>,
}

impl Request {
    /// Creates a request with the given method and request target.
    pub fn new(method: impl Into<Method>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            headers: Headers::new(),
            body: Bytes::new(),
            attributes: HashMap::new(),
        }
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full request target as given, including any query string.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the path portion of the request target, without the query string.
    pub fn path(&self) -> &str {
        match self.target.find('?') {
            Some(pos) => &self.target[..pos],
            None => &self.target,
        }
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the named attribute, or `None` if it was never attached.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the full attribute map.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Returns a new request with the given method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<Method>) -> Self {
        self.method = method.into();
        self
    }

    /// Returns a new request with the given request target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Returns a new request with the header set, replacing existing values.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Returns a new request with the header appended, keeping existing values.
    #[must_use]
    pub fn with_added_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns a new request with the given body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns a new request with one attribute attached.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns a new request with all entries of `attributes` merged in.
    ///
    /// Existing attributes with the same name are overwritten.
    #[must_use]
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Deserializes the body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(&self.body)
    }
}
