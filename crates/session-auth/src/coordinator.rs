//! Auth coordinator: session state machine and its two interceptors
//!
//! States:
//! - Unauthenticated: no credentials (initial, and after logout)
//! - Authenticated: credentials present, no refresh outstanding
//! - Refreshing: credentials present, one refresh call outstanding
//!
//! Transitions:
//! - login success → Authenticated
//! - 401 on a first attempt while Authenticated → Refreshing
//! - refresh success → Authenticated with the new pair
//! - refresh failure → Authenticated with the old pair; the failure goes to
//!   every waiting request, nothing logs the session out automatically
//! - logout → Unauthenticated from any state

use std::sync::Arc;

use common::Secret;
use futures_util::FutureExt;
use http_client::{
    Error, HandlerFuture, HttpClient, RequestInterceptor, RequestOverride, ResponseInterceptor,
    Result,
};
use tracing::{debug, info, warn};
use transport::header::{AUTHORIZATION, InvalidHeaderValue};
use transport::{HeaderValue, RequestDescriptor, StatusCode};

use crate::constants::{BEARER_PREFIX, REFRESH_PATH};
use crate::credentials::{Credentials, SessionStore};
use crate::gate::RefreshGate;
use crate::token;

/// Session state as observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Authenticated,
    Refreshing,
}

impl SessionStatus {
    /// Status label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Unauthenticated => "unauthenticated",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Refreshing => "refreshing",
        }
    }
}

/// Owns the session credentials and the refresh gate.
///
/// Cheap to clone; clones share the same session. Install it on a client
/// with `attach` (or `install`) before the client is shared.
#[derive(Clone, Default)]
pub struct AuthCoordinator {
    store: Arc<SessionStore>,
    gate: Arc<RefreshGate>,
}

impl AuthCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a coordinator and register its interceptors on `client`.
    pub fn attach(client: &mut HttpClient) -> Self {
        let coordinator = Self::new();
        coordinator.install(client);
        coordinator
    }

    /// Register the bearer request interceptor and the refresh-on-401
    /// response interceptor.
    pub fn install(&self, client: &mut HttpClient) {
        client.add_request_interceptor(BearerInterceptor {
            store: self.store.clone(),
        });
        client.add_response_interceptor(RefreshOnUnauthorized {
            coordinator: self.clone(),
        });
    }

    /// Seed the session with an existing token pair.
    pub fn set_credentials(&self, credentials: Credentials) {
        self.store.replace(credentials);
    }

    pub fn credentials(&self) -> Option<Arc<Credentials>> {
        self.store.credentials()
    }

    pub fn status(&self) -> SessionStatus {
        if self.store.credentials().is_none() {
            SessionStatus::Unauthenticated
        } else if self.gate.is_pending() {
            SessionStatus::Refreshing
        } else {
            SessionStatus::Authenticated
        }
    }

    /// Number of refresh episodes started by this session.
    pub fn refresh_episodes(&self) -> u64 {
        self.gate.episodes()
    }

    /// Exchange login and password for a token pair and store it.
    pub async fn login(
        &self,
        client: &HttpClient,
        login: &str,
        password: &Secret<String>,
    ) -> Result<()> {
        let pair = token::login(client, login, password).await?;
        self.store.replace(Credentials::from(pair));
        info!(login, "logged in");
        Ok(())
    }

    /// Drop both tokens. No network call is made.
    pub fn logout(&self) {
        self.store.clear();
        info!("logged out");
    }

    /// Join the pending refresh or start one.
    ///
    /// The refresh stores its result only if the session was not replaced or
    /// cleared while it was in flight.
    async fn refresh(&self, client: &HttpClient) -> Result<Arc<Credentials>> {
        let (current, generation) = self.store.snapshot();
        let joined = self.gate.join(generation, |episode| {
            let store = self.store.clone();
            let transport = client.transport().clone();
            let url = client.url(REFRESH_PATH);

            async move {
                let Some(current) = current else {
                    return Err(Error::AuthExhausted {
                        status: StatusCode::UNAUTHORIZED,
                        body: "session has no refresh token".into(),
                    });
                };

                match token::refresh_token(transport.as_ref(), &url, current.refresh_token()).await {
                    Ok(pair) => {
                        let fresh = Arc::new(Credentials::from(pair));
                        if store.replace_if_current(generation, fresh.clone()) {
                            info!(episode, "token refresh succeeded");
                        } else {
                            info!(episode, "session changed during refresh, discarding new tokens");
                        }
                        metrics::counter!("http_client_token_refresh_total", "outcome" => "success")
                            .increment(1);
                        Ok(fresh)
                    }
                    Err(e) => {
                        warn!(episode, error = %e, "token refresh failed");
                        metrics::counter!("http_client_token_refresh_total", "outcome" => "failure")
                            .increment(1);
                        Err(Error::RefreshFailed(Box::new(e)))
                    }
                }
            }
            .boxed()
        });

        if !joined.leader {
            debug!(episode = joined.episode, "waiting on refresh started by another request");
        }
        joined.future.await
    }
}

/// Sets `Authorization: Bearer <access token>` when the session has one.
struct BearerInterceptor {
    store: Arc<SessionStore>,
}

impl RequestInterceptor for BearerInterceptor {
    fn intercept(&self, request: &RequestDescriptor) -> RequestOverride {
        let Some(credentials) = self.store.credentials() else {
            return RequestOverride::unchanged();
        };
        match bearer_value(credentials.access_token()) {
            Ok(value) => RequestOverride::unchanged().header(AUTHORIZATION, value),
            Err(e) => {
                warn!(url = %request.url, error = %e, "skipping invalid bearer header value");
                RequestOverride::unchanged()
            }
        }
    }
}

fn bearer_value(token: &Secret<String>) -> std::result::Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("{BEARER_PREFIX}{}", token.expose()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Access token a request carried, if any.
fn bearer_token(request: &RequestDescriptor) -> Option<&str> {
    request
        .header_str(AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
}

/// Refreshes the token pair on a 401 and resends the request once.
///
/// A 401 for a request sent with tokens that have since been replaced is
/// resent with the current ones instead of refreshing again.
struct RefreshOnUnauthorized {
    coordinator: AuthCoordinator,
}

impl ResponseInterceptor for RefreshOnUnauthorized {
    fn on_error<'a>(
        &'a self,
        client: &'a HttpClient,
        error: &'a Error,
        request: &'a RequestDescriptor,
        sent: &'a RequestDescriptor,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let Error::Http { status, body } = error else {
                return Ok(None);
            };
            if *status != StatusCode::UNAUTHORIZED {
                return Ok(None);
            }
            let exhausted = || Error::AuthExhausted {
                status: *status,
                body: body.clone(),
            };

            if request.retry {
                warn!(url = %request.url, "unauthorized after token refresh, giving up");
                return Err(exhausted());
            }
            let Some(current) = self.coordinator.credentials() else {
                debug!(url = %request.url, "unauthorized with no refresh token");
                return Err(exhausted());
            };

            if bearer_token(sent) != Some(current.access_token().expose().as_str()) {
                debug!(url = %request.url, "session tokens changed since send, resending without refresh");
                return client.dispatch(request.as_retry(), true).await.map(Some);
            }

            self.coordinator.refresh(client).await?;

            debug!(url = %request.url, "resending request after token refresh");
            client.dispatch(request.as_retry(), true).await.map(Some)
        })
    }
}
