//! Shared types for the session client workspace
//!
//! `Secret` keeps bearer/refresh tokens and passwords out of logs; `Error` is
//! the configuration-loading error used by the facade and the CLI.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
