//! Static header injection from configuration
//!
//! Registered ahead of the bearer interceptor. Invalid names or values are
//! skipped with a warning, and an Authorization entry is refused so that
//! configuration can never shadow the session's bearer token.

use http_client::{RequestInterceptor, RequestOverride};
use std::str::FromStr;
use tracing::warn;
use transport::header::AUTHORIZATION;
use transport::{HeaderMap, HeaderName, HeaderValue, RequestDescriptor};

use crate::config::HeaderInjection;

/// Request interceptor adding a fixed set of headers to every request.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: HeaderMap,
}

impl StaticHeaders {
    pub fn from_config(injections: &[HeaderInjection]) -> Self {
        let mut headers = HeaderMap::new();
        for injection in injections {
            let name = match HeaderName::from_str(&injection.name) {
                Ok(n) => n,
                Err(e) => {
                    warn!(header = %injection.name, error = %e, "skipping invalid header name");
                    continue;
                }
            };
            if name == AUTHORIZATION {
                warn!(header = %injection.name, "refusing to inject authorization header from config");
                continue;
            }
            let value = match HeaderValue::from_str(&injection.value) {
                Ok(v) => v,
                Err(e) => {
                    warn!(header = %injection.name, error = %e, "skipping invalid header value");
                    continue;
                }
            };
            headers.insert(name, value);
        }
        Self { headers }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl RequestInterceptor for StaticHeaders {
    fn intercept(&self, _request: &RequestDescriptor) -> RequestOverride {
        RequestOverride {
            headers: self.headers.clone(),
            ..RequestOverride::default()
        }
    }
}
