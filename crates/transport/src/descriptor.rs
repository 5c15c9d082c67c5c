//! Request descriptors

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// Everything needed to perform one HTTP call.
///
/// Descriptors are cheap to clone (`Bytes` body), which the pipeline relies on
/// when it keeps the pre-interceptor descriptor around for error handlers and
/// for the single refresh-and-resend cycle.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Set once this request has been resent after a token refresh.
    pub retry: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
            retry: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `body` as JSON and set `Content-Type: application/json`.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> serde_json::Result<Self> {
        let encoded = serde_json::to_vec(body)?;
        self.body = Some(Bytes::from(encoded));
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Copy of this descriptor marked as already resent once.
    pub fn as_retry(&self) -> Self {
        Self {
            retry: true,
            ..self.clone()
        }
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    #[test]
    fn with_json_sets_body_and_content_type() {
        let request = RequestDescriptor::post("http://localhost/auth/login")
            .with_json(&serde_json::json!({"login": "foo", "password": "foo"}))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header_str("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["login"], "foo");
        assert!(!request.retry);
    }

    #[test]
    fn as_retry_marks_only_the_copy() {
        let original = RequestDescriptor::get("http://localhost/users")
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer TOKEN"));
        let retried = original.as_retry();

        assert!(retried.retry);
        assert!(!original.retry, "original descriptor must stay unmarked");
        assert_eq!(retried.url, original.url);
        assert_eq!(retried.header_str("authorization"), Some("Bearer TOKEN"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = RequestDescriptor::get("http://localhost/users")
            .with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"));
        assert_eq!(request.header_str("X-Trace"), Some("abc"));
        assert_eq!(request.header_str("x-missing"), None);
    }
}
