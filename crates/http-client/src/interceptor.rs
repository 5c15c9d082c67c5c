//! Interceptor traits and partial request overrides

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use transport::{HeaderMap, HeaderName, HeaderValue, Method, RequestDescriptor, Response};

use crate::client::HttpClient;
use crate::error::{Error, Result};

/// Fields a request interceptor wants to change.
///
/// `None` leaves the accumulated value alone. Headers are merged key-by-key:
/// a header set by an earlier interceptor survives unless this override
/// names the same header.
#[derive(Debug, Clone, Default)]
pub struct RequestOverride {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub retry: Option<bool>,
}

impl RequestOverride {
    /// An override that changes nothing.
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.method.is_none()
            && self.headers.is_empty()
            && self.body.is_none()
            && self.retry.is_none()
    }

    /// Fold this override into `request`.
    pub fn apply(self, request: &mut RequestDescriptor) {
        if let Some(url) = self.url {
            request.url = url;
        }
        if let Some(method) = self.method {
            request.method = method;
        }
        for (name, value) in &self.headers {
            request.headers.insert(name.clone(), value.clone());
        }
        if let Some(body) = self.body {
            request.body = Some(body);
        }
        if let Some(retry) = self.retry {
            request.retry = retry;
        }
    }
}

/// Maps a descriptor to a partial override before it is sent.
///
/// Interceptors are synchronous and must not block: they read state that is
/// current at send time (e.g. the session's access token).
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &RequestDescriptor) -> RequestOverride;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&RequestDescriptor) -> RequestOverride + Send + Sync,
{
    fn intercept(&self, request: &RequestDescriptor) -> RequestOverride {
        self(request)
    }
}

/// Boxed future returned by `ResponseInterceptor::on_error`.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Response>>> + Send + 'a>>;

/// Runs when a dispatched request fails.
///
/// Outcomes:
/// - `Ok(None)`: not handled here, the next interceptor runs
/// - `Ok(Some(response))`: recovered, the pipeline resolves with `response`
/// - `Err(e)`: the pipeline fails with `e`, remaining interceptors are skipped
///
/// `request` is the descriptor as the caller built it, before request
/// interceptors ran; resends start from it. `sent` is what actually went to
/// the transport. `client` is the pipeline itself so a handler can resend.
pub trait ResponseInterceptor: Send + Sync {
    fn on_error<'a>(
        &'a self,
        client: &'a HttpClient,
        error: &'a Error,
        request: &'a RequestDescriptor,
        sent: &'a RequestDescriptor,
    ) -> HandlerFuture<'a>;
}
