//! Immutable HTTP response values.

use bytes::Bytes;

use super::{Headers, StatusCode};

/// An immutable HTTP response.
///
/// Like [`Request`](super::Request), a `Response` is a value: `with_*`
/// builders return a new value rather than mutating in place. Middleware
/// that decorates a downstream response chains builders on the value it
/// received.
///
/// # Examples
///
/// ```
/// use relay::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Created)
///     .with_header("Location", "/cats/42")
///     .with_body("created");
///
/// assert_eq!(response.status(), StatusCode::Created);
/// assert_eq!(response.headers().get("location"), Some("/cats/42"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the reason phrase: the custom one if set, else the canonical one.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.status.canonical_reason(),
        }
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the response body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns a new response with the given status and the canonical reason phrase.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self.reason = None;
        self
    }

    /// Returns a new response with a custom reason phrase.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns a new response with the header set, replacing existing values.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Returns a new response with the header appended, keeping existing values.
    #[must_use]
    pub fn with_added_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns a new response without any values for the given header.
    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// Returns a new response with the given body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns a new response with `value` serialized as the JSON body and
    /// the `Content-Type` header set to `application/json`.
    pub fn with_json<T>(self, value: &T) -> Result<Self, serde_json::Error>
    where
        T: serde::Serialize,
    {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}
