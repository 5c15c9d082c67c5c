//! The pipeline: request chain, transport call, error chain

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, debug_span};
use transport::header::CONTENT_TYPE;
use transport::{HeaderValue, RequestDescriptor, Response, Transport};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};

/// HTTP client with ordered request and response interceptor chains.
///
/// Interceptors are registered through `&mut self` before the client is
/// shared, so both chains are fixed while requests are in flight.
pub struct HttpClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path on the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn add_request_interceptor(&mut self, interceptor: impl RequestInterceptor + 'static) {
        self.request_interceptors.push(Arc::new(interceptor));
    }

    pub fn add_response_interceptor(&mut self, interceptor: impl ResponseInterceptor + 'static) {
        self.response_interceptors.push(Arc::new(interceptor));
    }

    /// Run the request chain over a copy of `request`.
    ///
    /// Each interceptor sees the descriptor as modified by all interceptors
    /// registered before it.
    pub fn prepare(&self, request: &RequestDescriptor) -> RequestDescriptor {
        self.request_interceptors
            .iter()
            .fold(request.clone(), |mut acc, interceptor| {
                interceptor.intercept(&acc).apply(&mut acc);
                acc
            })
    }

    /// Send `request`, optionally through the request chain first.
    ///
    /// Returns the response for 2xx. Any other outcome is handed to the
    /// response chain along with `request` as given here and the prepared
    /// copy that was sent, and the chain's outcome is returned.
    ///
    /// Boxed because response interceptors may call back into `dispatch`.
    pub fn dispatch(
        &self,
        request: RequestDescriptor,
        apply_request_interceptors: bool,
    ) -> BoxFuture<'_, Result<Response>> {
        let span = debug_span!(
            "dispatch",
            request_id = %format!("req_{}", Uuid::new_v4().as_simple()),
            method = %request.method,
            url = %request.url,
            retry = request.retry,
        );
        async move {
            let prepared = if apply_request_interceptors {
                self.prepare(&request)
            } else {
                request.clone()
            };
            match send_classified(self.transport.as_ref(), &prepared).await {
                Ok(response) => Ok(response),
                Err(error) => self.handle_error(error, &request, &prepared).await,
            }
        }
        .instrument(span)
        .boxed()
    }

    /// Send without either interceptor chain.
    ///
    /// Used for calls whose failure must not re-enter the response chain,
    /// such as the token refresh itself.
    pub async fn send_unintercepted(&self, request: &RequestDescriptor) -> Result<Response> {
        send_classified(self.transport.as_ref(), request).await
    }

    async fn handle_error(
        &self,
        error: Error,
        request: &RequestDescriptor,
        sent: &RequestDescriptor,
    ) -> Result<Response> {
        for interceptor in &self.response_interceptors {
            if let Some(response) = interceptor.on_error(self, &error, request, sent).await? {
                debug!(status = response.status().as_u16(), "request recovered by interceptor");
                return Ok(response);
            }
        }
        debug!(error = %error, "request failed");
        Err(error)
    }

    /// GET `path` through the full pipeline and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = json_request(RequestDescriptor::get(self.url(path)));
        let response = self.dispatch(request, true).await?;
        decode(&response)
    }

    /// POST `body` as JSON to `path` through the full pipeline and decode the
    /// JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::post(self.url(path))
            .with_json(body)
            .map_err(|e| Error::InvalidRequest(format!("encoding request body: {e}")))?;
        let response = self.dispatch(request, true).await?;
        decode(&response)
    }
}

/// Send through `transport` and classify: 2xx is `Ok`, any other status is
/// `Error::Http`, a transport failure is `Error::Network`.
pub async fn send_classified(
    transport: &dyn Transport,
    request: &RequestDescriptor,
) -> Result<Response> {
    let response = match transport.send(request).await {
        Ok(response) => response,
        Err(e) => {
            metrics::counter!("http_client_requests_total", "status" => "network_error")
                .increment(1);
            return Err(Error::Network(e));
        }
    };

    let status = response.status();
    metrics::counter!("http_client_requests_total", "status" => status.as_u16().to_string())
        .increment(1);

    if response.is_success() {
        Ok(response)
    } else {
        Err(Error::Http {
            status,
            body: response.text(),
        })
    }
}

fn json_request(request: RequestDescriptor) -> RequestDescriptor {
    request.with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
}

fn decode<T: DeserializeOwned>(response: &Response) -> Result<T> {
    response
        .decode()
        .map_err(|e| Error::Decode(format!("invalid JSON from {}: {e}", response.status())))
}
