//! Login and refresh calls
//!
//! Both endpoints take a small JSON body and answer with the same token pair
//! shape: `{"token": "...", "refreshToken": "..."}`.

use common::Secret;
use http_client::{Error, HttpClient, Result, send_classified};
use serde::{Deserialize, Serialize};
use transport::{RequestDescriptor, Transport};

use crate::constants::LOGIN_PATH;

/// Token pair returned by both `/auth/login` and `/auth/refresh`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

// No Debug: carries the password.
#[derive(Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Exchange login and password for a token pair.
///
/// Sent without the interceptor chains: a rejected login must surface as is
/// rather than being treated as an expired session.
pub async fn login(client: &HttpClient, login: &str, password: &Secret<String>) -> Result<TokenPair> {
    let request = RequestDescriptor::post(client.url(LOGIN_PATH))
        .with_json(&LoginRequest {
            login,
            password: password.expose(),
        })
        .map_err(|e| Error::InvalidRequest(format!("encoding login body: {e}")))?;

    let response = client.send_unintercepted(&request).await?;
    response
        .decode()
        .map_err(|e| Error::Decode(format!("invalid login response: {e}")))
}

/// Exchange a refresh token for a new token pair.
///
/// Takes the transport directly so the call can run inside a `'static`
/// shared future that outlives any single borrower of the client.
pub async fn refresh_token(
    transport: &dyn Transport,
    url: &str,
    refresh: &Secret<String>,
) -> Result<TokenPair> {
    let request = RequestDescriptor::post(url)
        .with_json(&RefreshRequest {
            refresh_token: refresh.expose(),
        })
        .map_err(|e| Error::InvalidRequest(format!("encoding refresh body: {e}")))?;

    let response = send_classified(transport, &request).await?;
    response
        .decode()
        .map_err(|e| Error::Decode(format!("invalid refresh response: {e}")))
}
