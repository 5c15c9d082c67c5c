//! `Api` facade
//!
//! Builds one `HttpClient` per session with this interceptor order:
//! 1. Configured static headers
//! 2. Bearer token from the session
//!
//! and the session's refresh-on-401 handler as the only response interceptor.

use std::sync::Arc;

use common::Secret;
use http_client::{HttpClient, Result};
use serde_json::Value;
use session_auth::{AuthCoordinator, Credentials, SessionStatus};
use tracing::info;
use transport::{ReqwestTransport, Transport};

use crate::config::Config;
use crate::headers::StaticHeaders;

/// Protected resource listing users.
pub const USERS_PATH: &str = "/users";

/// Session-aware API client.
///
/// `Api` is `Send + Sync`; share it behind an `Arc` to issue concurrent
/// requests against one session.
pub struct Api {
    client: HttpClient,
    session: AuthCoordinator,
}

impl Api {
    /// Client over `reqwest` using the configured base URL, timeout and
    /// static headers.
    pub fn from_config(config: &Config) -> Self {
        let transport = Arc::new(ReqwestTransport::with_timeout(config.api.timeout()));
        Self::build(
            &config.api.base_url,
            transport,
            StaticHeaders::from_config(&config.headers),
        )
    }

    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self::build(base_url, transport, StaticHeaders::default())
    }

    fn build(base_url: &str, transport: Arc<dyn Transport>, headers: StaticHeaders) -> Self {
        let mut client = HttpClient::new(base_url, transport);
        let static_headers = headers.len();
        if !headers.is_empty() {
            client.add_request_interceptor(headers);
        }
        let session = AuthCoordinator::attach(&mut client);
        info!(
            base_url = client.base_url(),
            transport = client.transport().id(),
            static_headers,
            "api client ready"
        );
        Self { client, session }
    }

    /// Start from an existing token pair instead of logging in.
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        self.session.set_credentials(credentials);
        self
    }

    pub async fn login(&self, login: &str, password: &Secret<String>) -> Result<()> {
        self.session.login(&self.client, login, password).await
    }

    /// Forget the session locally. Later requests carry no bearer header.
    pub fn logout(&self) {
        self.session.logout();
    }

    pub async fn get_users(&self) -> Result<Vec<Value>> {
        self.client.get(USERS_PATH).await
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.credentials().is_some()
    }

    pub fn session(&self) -> &AuthCoordinator {
        &self.session
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}
