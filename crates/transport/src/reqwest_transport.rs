//! reqwest-backed transport
//!
//! Sends a descriptor with a shared `reqwest::Client`, buffers the whole body
//! and hands back status, headers and bytes. Non-2xx statuses are returned as
//! ordinary responses; only failures before a response exist become errors.

use std::time::Duration;

use tracing::debug;

use crate::{RequestDescriptor, Response, SendFuture, Transport, TransportError};

/// Default per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Production transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(reqwest::Client::new(), timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

impl Transport for ReqwestTransport {
    fn id(&self) -> &str {
        "reqwest"
    }

    fn send<'a>(&'a self, request: &'a RequestDescriptor) -> SendFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.clone(), &request.url)
                .headers(request.headers.clone())
                .timeout(self.timeout);
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await.map_err(map_send_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Other(format!("reading response body: {e}")))?;

            debug!(
                method = %request.method,
                url = %request.url,
                status = status.as_u16(),
                bytes = body.len(),
                "transport call completed"
            );
            Ok(Response::new(status, headers, body))
        })
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use reqwest::header::{AUTHORIZATION, HeaderValue};
    use tokio::net::TcpListener;

    /// Start a mock server that echoes method, headers and body back as JSON.
    async fn start_echo_server() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let app =
                axum::Router::new().fallback(|request: axum::http::Request<Body>| async move {
                    let mut headers = serde_json::Map::new();
                    for (name, value) in request.headers() {
                        headers.insert(
                            name.to_string(),
                            serde_json::Value::String(value.to_str().unwrap_or("").to_string()),
                        );
                    }
                    let method = request.method().to_string();
                    let path = request.uri().path().to_string();
                    let body = axum::body::to_bytes(request.into_body(), 1024 * 1024)
                        .await
                        .unwrap();
                    let status = if path == "/missing" {
                        StatusCode::NOT_FOUND
                    } else {
                        StatusCode::OK
                    };
                    (
                        status,
                        axum::Json(serde_json::json!({
                            "method": method,
                            "path": path,
                            "headers": headers,
                            "body": String::from_utf8_lossy(&body),
                        })),
                    )
                });
            axum::serve(listener, app).await.unwrap();
        });

        (url, handle)
    }

    #[tokio::test]
    async fn sends_method_headers_and_body() {
        let (url, _server) = start_echo_server().await;
        let transport = ReqwestTransport::default();

        let request = RequestDescriptor::post(format!("{url}/auth/refresh"))
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer TOKEN"))
            .with_json(&serde_json::json!({"refreshToken": "REFRESH_TOKEN"}))
            .unwrap();
        let response = transport.send(&request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let echoed: serde_json::Value = response.decode().unwrap();
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["path"], "/auth/refresh");
        assert_eq!(echoed["headers"]["authorization"], "Bearer TOKEN");
        assert_eq!(echoed["headers"]["content-type"], "application/json");
        assert_eq!(echoed["body"], r#"{"refreshToken":"REFRESH_TOKEN"}"#);
    }

    #[tokio::test]
    async fn non_2xx_is_returned_as_response() {
        let (url, _server) = start_echo_server().await;
        let transport = ReqwestTransport::default();

        let response = transport
            .send(&RequestDescriptor::get(format!("{url}/missing")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::default();
        let result = transport
            .send(&RequestDescriptor::get(format!("http://{addr}/users")))
            .await;
        assert!(result.is_err(), "refused connection must fail: {result:?}");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    // Accept but never respond
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    drop(socket);
                });
            }
        });

        let transport = ReqwestTransport::with_timeout(Duration::from_millis(100));
        let result = transport
            .send(&RequestDescriptor::get(format!("http://{addr}/users")))
            .await;
        assert!(
            matches!(result, Err(TransportError::Timeout(_))),
            "expected timeout, got {result:?}"
        );
    }

    #[test]
    fn id_returns_reqwest() {
        assert_eq!(ReqwestTransport::default().id(), "reqwest");
        assert_eq!(ReqwestTransport::default().timeout(), DEFAULT_TIMEOUT);
    }
}
