//! Session credentials and their swap-only store
//!
//! The access and refresh tokens live together in one `Credentials` value and
//! the store only ever swaps whole values, so a reader can never see a new
//! access token next to an old refresh token.

use std::sync::{Arc, PoisonError, RwLock};

use common::Secret;

use crate::token::TokenPair;

/// An access/refresh token pair.
///
/// Both fields are always present: "no session" is modelled as the absence
/// of a `Credentials` value, not as empty fields.
#[derive(Debug, Clone)]
pub struct Credentials {
    access: Secret<String>,
    refresh: Secret<String>,
}

impl Credentials {
    pub fn new(access: impl Into<Secret<String>>, refresh: impl Into<Secret<String>>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    pub fn access_token(&self) -> &Secret<String> {
        &self.access
    }

    pub fn refresh_token(&self) -> &Secret<String> {
        &self.refresh
    }
}

impl From<TokenPair> for Credentials {
    fn from(pair: TokenPair) -> Self {
        Self::new(pair.token, pair.refresh_token)
    }
}

#[derive(Default)]
struct Slot {
    credentials: Option<Arc<Credentials>>,
    generation: u64,
}

/// Current credentials plus a generation counter bumped on every change.
///
/// The lock is a std `RwLock`: it is only held for a pointer swap or clone
/// and never across an await.
#[derive(Default)]
pub(crate) struct SessionStore {
    slot: RwLock<Slot>,
}

impl SessionStore {
    pub(crate) fn credentials(&self) -> Option<Arc<Credentials>> {
        self.read().credentials.clone()
    }

    /// Credentials together with the generation they belong to.
    pub(crate) fn snapshot(&self) -> (Option<Arc<Credentials>>, u64) {
        let slot = self.read();
        (slot.credentials.clone(), slot.generation)
    }

    /// Install `credentials` (login or explicit seeding). Returns the new
    /// generation.
    pub(crate) fn replace(&self, credentials: Credentials) -> u64 {
        let mut slot = self.write();
        slot.credentials = Some(Arc::new(credentials));
        slot.generation += 1;
        slot.generation
    }

    /// Install refreshed credentials only if nothing replaced or cleared the
    /// session since `generation` was read.
    pub(crate) fn replace_if_current(&self, generation: u64, credentials: Arc<Credentials>) -> bool {
        let mut slot = self.write();
        if slot.generation != generation {
            return false;
        }
        slot.credentials = Some(credentials);
        slot.generation += 1;
        true
    }

    pub(crate) fn clear(&self) {
        let mut slot = self.write();
        slot.credentials = None;
        slot.generation += 1;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(suffix: &str) -> Credentials {
        Credentials::new(format!("TOKEN{suffix}"), format!("REFRESH_TOKEN{suffix}"))
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let debug = format!("{:?}", pair(""));
        assert!(!debug.contains("TOKEN"), "tokens leaked: {debug}");
    }

    #[test]
    fn converts_from_token_pair() {
        let credentials = Credentials::from(TokenPair {
            token: "TOKEN2".into(),
            refresh_token: "REFRESH_TOKEN2".into(),
        });
        assert_eq!(credentials.access_token().expose(), "TOKEN2");
        assert_eq!(credentials.refresh_token().expose(), "REFRESH_TOKEN2");
    }

    #[test]
    fn replace_and_clear_swap_both_tokens() {
        let store = SessionStore::default();
        assert!(store.credentials().is_none());

        store.replace(pair(""));
        let current = store.credentials().unwrap();
        assert_eq!(current.access_token().expose(), "TOKEN");
        assert_eq!(current.refresh_token().expose(), "REFRESH_TOKEN");

        store.clear();
        assert!(store.credentials().is_none());
    }

    #[test]
    fn stale_generation_is_rejected() {
        let store = SessionStore::default();
        store.replace(pair(""));
        let (_, generation) = store.snapshot();

        // Session changed underneath (e.g. logout) before the refresh landed
        store.clear();
        assert!(!store.replace_if_current(generation, Arc::new(pair("2"))));
        assert!(store.credentials().is_none());
    }

    #[test]
    fn current_generation_is_accepted() {
        let store = SessionStore::default();
        let generation = store.replace(pair(""));

        assert!(store.replace_if_current(generation, Arc::new(pair("2"))));
        assert_eq!(
            store.credentials().unwrap().access_token().expose(),
            "TOKEN2"
        );
        // The swap itself advances the generation
        assert_ne!(store.snapshot().1, generation);
    }
}
