//! Single-flight refresh gate
//!
//! Holds at most one pending refresh. The first caller to find the slot empty
//! starts the refresh and stores a shared handle on its outcome; everyone
//! arriving while it is stored awaits a clone of the same `Shared` future, so
//! one refresh call serves the whole batch.
//!
//! The refresh runs as its own task, so it finishes even if every waiter is
//! dropped. A guard inside that task clears the slot when the refresh ends,
//! whichever way it ends. Once cleared, the next caller starts a fresh
//! episode.
//!
//! Each episode records the session generation it started from. A caller
//! from a newer generation (after logout or a new login) never joins it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use http_client::{Error, Result};
use tracing::{Instrument, debug};

use crate::credentials::Credentials;

/// Shared handle on one refresh episode's outcome.
pub type RefreshFuture = Shared<BoxFuture<'static, Result<Arc<Credentials>>>>;

struct PendingRefresh {
    episode: u64,
    generation: u64,
    future: RefreshFuture,
}

/// A handle returned by `RefreshGate::join`.
pub struct Joined {
    pub episode: u64,
    /// Whether this caller created the episode.
    pub leader: bool,
    pub future: RefreshFuture,
}

/// Coalesces concurrent refreshes into one call per episode.
///
/// The slot lock is a std `Mutex`: check-then-set happens under a single
/// acquisition and the lock is never held across an await, which also lets
/// the release guard clear it from `Drop`.
#[derive(Default)]
pub struct RefreshGate {
    slot: Mutex<Option<PendingRefresh>>,
    episodes: AtomicU64,
}

impl RefreshGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Await-able handle on the pending refresh for session `generation`,
    /// spawning one built by `start` if none is pending for it.
    ///
    /// `start` receives the new episode number and must only build the
    /// future, not run it: it is called while the slot is locked. Must be
    /// called from within a tokio runtime.
    pub fn join<F>(self: &Arc<Self>, generation: u64, start: F) -> Joined
    where
        F: FnOnce(u64) -> BoxFuture<'static, Result<Arc<Credentials>>>,
    {
        let mut slot = self.lock();
        if let Some(pending) = slot.as_ref() {
            if pending.generation == generation {
                debug!(episode = pending.episode, "joining pending token refresh");
                return Joined {
                    episode: pending.episode,
                    leader: false,
                    future: pending.future.clone(),
                };
            }
            debug!(
                episode = pending.episode,
                generation, "pending token refresh belongs to an earlier session"
            );
        }

        let episode = self.episodes.fetch_add(1, Ordering::SeqCst) + 1;
        let release = SlotRelease {
            gate: Arc::downgrade(self),
            episode,
        };
        let work = start(episode);
        let task = tokio::spawn(
            async move {
                let _release = release;
                work.await
            }
            .in_current_span(),
        );
        let future = async move {
            task.await.unwrap_or_else(|e| {
                Err(Error::RefreshFailed(Box::new(Error::InvalidRequest(format!(
                    "refresh task ended abnormally: {e}"
                )))))
            })
        }
        .boxed()
        .shared();

        *slot = Some(PendingRefresh {
            episode,
            generation,
            future: future.clone(),
        });
        debug!(episode, generation, "started token refresh");

        Joined {
            episode,
            leader: true,
            future,
        }
    }

    /// Whether a refresh is currently outstanding.
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Number of refresh episodes started so far.
    pub fn episodes(&self) -> u64 {
        self.episodes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingRefresh>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the slot when the refresh task finishes or is torn down.
///
/// Only clears its own episode, so a late drop can never evict a newer one.
struct SlotRelease {
    gate: Weak<RefreshGate>,
    episode: u64,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        let Some(gate) = self.gate.upgrade() else {
            return;
        };
        let mut slot = gate.lock();
        if slot.as_ref().is_some_and(|p| p.episode == self.episode) {
            *slot = None;
            debug!(episode = self.episode, "token refresh settled, gate released");
        }
    }
}
