//! Bearer-token session with transparent refresh
//!
//! `AuthCoordinator` owns the session credentials and plugs two interceptors
//! into an `HttpClient`:
//! - a request interceptor that sets `Authorization: Bearer <token>` from the
//!   credentials current at send time;
//! - a response interceptor that, on a 401, refreshes the token pair once and
//!   resends the failed request a single time.
//!
//! Concurrent 401s share one refresh call through `RefreshGate`. A request
//! that has already been resent is never refreshed again, so a token the
//! server keeps rejecting surfaces as `Error::AuthExhausted` instead of a loop.
//!
//! Session lifecycle:
//! 1. `login` posts to `/auth/login` and stores the returned token pair
//! 2. Requests carry the access token
//! 3. A 401 posts the refresh token to `/auth/refresh`; the new pair replaces
//!    the old one and the request is resent
//! 4. `logout` drops both tokens locally; no network call

pub mod constants;
pub mod coordinator;
pub mod credentials;
pub mod gate;
pub mod token;

pub use constants::*;
pub use coordinator::{AuthCoordinator, SessionStatus};
pub use credentials::Credentials;
pub use gate::RefreshGate;
pub use token::{TokenPair, login, refresh_token};

pub use http_client::{Error, Result};
