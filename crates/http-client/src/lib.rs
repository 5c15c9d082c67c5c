//! Interceptor pipeline around a `Transport`
//!
//! `HttpClient` owns two append-only chains:
//! - request interceptors, folded left-to-right over a descriptor before it
//!   is sent, each returning a partial `RequestOverride`;
//! - response interceptors, run in registration order whenever a call fails
//!   (non-2xx or transport error), each able to pass, recover, or fail.
//!
//! Request flow:
//! 1. `get`/`post` build a descriptor from the base URL
//! 2. `dispatch` runs the request chain and sends via the transport
//! 3. 2xx resolves; anything else goes to the response chain together with
//!    the descriptor as it was *before* the request chain ran and the
//!    prepared copy that was sent
//! 4. A response interceptor may resend through `dispatch` (e.g. after a
//!    token refresh), so the request chain sees current state again

pub mod client;
pub mod error;
pub mod interceptor;

pub use client::{HttpClient, send_classified};
pub use error::{Error, Result};
pub use interceptor::{HandlerFuture, RequestInterceptor, RequestOverride, ResponseInterceptor};

pub use transport::{
    HeaderMap, HeaderName, HeaderValue, Method, RequestDescriptor, Response, StatusCode,
    Transport, TransportError,
};
