//! Fixed endpoints and header formats of the session API

/// Credential exchange endpoint, relative to the base URL.
pub const LOGIN_PATH: &str = "/auth/login";

/// Token refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Scheme prefix of the Authorization header value.
pub const BEARER_PREFIX: &str = "Bearer ";
