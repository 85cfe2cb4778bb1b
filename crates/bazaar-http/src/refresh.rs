//! Single-flight credential refresh.
//!
//! When several requests fail authorization at once, only the first one
//! performs the refresh exchange. The others park on a ticket and receive
//! the same outcome once the exchange settles.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, instrument, warn};

use bazaar_core::error::AuthError;
use bazaar_core::{AccessToken, CredentialPair, CredentialStore, Error, RefreshToken};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// Session lifecycle signals observed by the hosting application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login stored a new credential pair.
    LoggedIn,
    /// A refresh exchange replaced the credential pair.
    Refreshed,
    /// The user logged out; credentials were cleared.
    LoggedOut,
    /// The refresh exchange failed; credentials were cleared and the user
    /// must be taken to a logged-out entry point.
    Terminated { reason: String },
}

type Ticket = oneshot::Sender<Result<AccessToken, AuthError>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    pending: VecDeque<Ticket>,
    /// The access token whose refresh was last rejected, with the rejection.
    rejected: Option<(AccessToken, AuthError)>,
}

/// Coordinates refresh exchanges so at most one is outstanding.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    store: Arc<dyn CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

enum Role {
    Leader(CredentialPair),
    Waiter(oneshot::Receiver<Result<AccessToken, AuthError>>),
    AlreadyRefreshed(AccessToken),
    Rejected(AuthError),
}

impl RefreshCoordinator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(RefreshState::default()),
            store,
            events,
        }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether an exchange is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of callers parked behind the outstanding exchange.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// The terminal rejection recorded for `token`, if its refresh failed.
    ///
    /// Lets a request that was sent with `token` but answered only after the
    /// session ended fail the same way as the requests that waited.
    pub fn rejection_for(&self, token: &AccessToken) -> Option<AuthError> {
        match &self.lock().rejected {
            Some((rejected, err)) if rejected == token => Some(err.clone()),
            _ => None,
        }
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Obtain a fresh access token.
    ///
    /// `stale` is the token the caller's rejected request carried. If the
    /// store already holds a different token, a refresh has completed since
    /// that request was sent and the current token is returned directly.
    /// Otherwise the caller either runs `exchange` (first in) or waits for
    /// the exchange already running. A waiter whose leader is dropped before
    /// settling starts over, so one of the waiters takes the exchange over.
    ///
    /// On exchange success the new pair is saved before any waiter is
    /// released. On failure the store is cleared (unless a login replaced
    /// the pair meanwhile), every waiter receives the same
    /// [`AuthError::RefreshRejected`], and [`SessionEvent::Terminated`] is
    /// emitted. Failures are never retried.
    #[instrument(skip_all)]
    pub async fn refresh<F, Fut>(
        &self,
        stale: Option<&AccessToken>,
        exchange: F,
    ) -> Result<AccessToken, AuthError>
    where
        F: FnOnce(RefreshToken) -> Fut,
        Fut: Future<Output = Result<CredentialPair, Error>>,
    {
        let pair = loop {
            match self.claim(stale) {
                Role::Leader(pair) => break pair,
                Role::AlreadyRefreshed(token) => {
                    debug!("Credentials changed since request was sent, reusing");
                    return Ok(token);
                }
                Role::Rejected(err) => return Err(err),
                Role::Waiter(rx) => {
                    debug!("Refresh already in flight, waiting");
                    match rx.await {
                        Ok(Err(AuthError::RefreshAbandoned)) | Err(_) => {
                            debug!("Refresh leader went away, starting over");
                        }
                        Ok(outcome) => return outcome,
                    }
                }
            }
        };

        let mut flight = InFlight {
            coordinator: self,
            settled: false,
        };

        info!("Refreshing credentials");
        let exchanged = pair.refresh_token.clone();
        match exchange(pair.refresh_token).await {
            Ok(fresh) => {
                self.store.save(&fresh);
                debug!("Credentials refreshed");
                flight.settle(Ok(fresh.access_token.clone()), Some(SessionEvent::Refreshed));
                Ok(fresh.access_token)
            }
            Err(e) => match self.store.load() {
                Some(current) if current.refresh_token != exchanged => {
                    debug!(error = %e, "Refresh failed but credentials were replaced, reusing");
                    flight.settle(Ok(current.access_token.clone()), None);
                    Ok(current.access_token)
                }
                _ => {
                    warn!(error = %e, "Refresh exchange failed, clearing credentials");
                    self.store.clear();
                    let err = AuthError::RefreshRejected {
                        reason: e.to_string(),
                    };
                    self.lock().rejected = Some((pair.access_token, err.clone()));
                    flight.settle(
                        Err(err.clone()),
                        Some(SessionEvent::Terminated {
                            reason: err.to_string(),
                        }),
                    );
                    Err(err)
                }
            },
        }
    }

    /// Decide this caller's part in the refresh.
    fn claim(&self, stale: Option<&AccessToken>) -> Role {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.pending.push_back(tx);
            return Role::Waiter(rx);
        }

        match self.store.load() {
            Some(current) if Some(&current.access_token) != stale => {
                Role::AlreadyRefreshed(current.access_token)
            }
            Some(current) => {
                state.in_flight = true;
                Role::Leader(current)
            }
            None => {
                if let (Some(stale), Some((rejected, err))) = (stale, &state.rejected)
                    && rejected == stale
                {
                    return Role::Rejected(err.clone());
                }
                drop(state);
                warn!("No refresh token stored");
                let err = AuthError::RefreshRejected {
                    reason: "no refresh token stored".to_string(),
                };
                self.emit(SessionEvent::Terminated {
                    reason: err.to_string(),
                });
                Role::Rejected(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Clear the in-flight flag and hand back the queued tickets, FIFO.
    fn drain(&self) -> VecDeque<Ticket> {
        let mut state = self.lock();
        state.in_flight = false;
        std::mem::take(&mut state.pending)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &state.in_flight)
            .field("pending", &state.pending.len())
            .finish()
    }
}

/// Owned by the leader while its exchange runs.
///
/// If the leader is dropped before settling, waiters are told with
/// [`AuthError::RefreshAbandoned`] and retry; the store is left as it was.
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: Result<AccessToken, AuthError>, event: Option<SessionEvent>) {
        self.settled = true;

        let tickets = self.coordinator.drain();
        debug!(waiters = tickets.len(), "Releasing queued requests");
        for ticket in tickets {
            let _ = ticket.send(outcome.clone());
        }

        if let Some(event) = event {
            self.coordinator.emit(event);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let tickets = self.coordinator.drain();
        warn!(waiters = tickets.len(), "Refresh abandoned, waiters will retry");
        for ticket in tickets {
            let _ = ticket.send(Err(AuthError::RefreshAbandoned));
        }
    }
}
