//! Transport abstraction for the session client
//!
//! Defines the `Transport` trait that decouples the interceptor pipeline from
//! the mechanism that actually puts bytes on the wire. `ReqwestTransport` is
//! the production implementation; tests substitute scripted transports that
//! implement the same trait.
//!
//! A transport performs exactly one HTTP call per `send`. It does not retry,
//! classify status codes or touch credentials: a 401 or 500 is still an
//! `Ok(Response)` at this layer.

pub mod descriptor;
pub mod reqwest_transport;
pub mod response;

pub use descriptor::RequestDescriptor;
pub use reqwest_transport::ReqwestTransport;
pub use response::Response;

pub use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
pub use reqwest::{Method, StatusCode};

use std::future::Future;
use std::pin::Pin;

/// Failures that happen before any response is received.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Boxed future returned by `Transport::send`.
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;

/// Performs one HTTP call for a prepared request.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Transport>`). The `retry` marker on the descriptor is
/// client-side bookkeeping and is never sent.
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "reqwest").
    fn id(&self) -> &str;

    fn send<'a>(&'a self, request: &'a RequestDescriptor) -> SendFuture<'a>;
}
