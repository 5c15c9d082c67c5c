//! Session API facade
//!
//! Thin domain layer over the interceptor pipeline: `Api` wires a transport,
//! configured static headers and the auth coordinator into one `HttpClient`
//! and exposes `login`, `logout` and `get_users`. Token refresh is invisible
//! to callers apart from latency.

pub mod client;
pub mod config;
pub mod headers;

pub use client::Api;
pub use config::{ApiConfig, Config, HeaderInjection, login_from_env};
pub use headers::StaticHeaders;

pub use http_client::{Error, Result};
pub use session_auth::{Credentials, SessionStatus};
