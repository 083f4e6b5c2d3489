//! Single-flight refresh coordination.
//!
//! At most one refresh call is in flight per [`SessionKey`]. The first caller
//! spawns the refresh and registers a shared ticket; concurrent callers with the
//! same key clone that ticket and observe the same outcome. The spawned task
//! removes its own entry when it finishes, success or failure, so tickets never
//! outlive the refresh that produced them.
//!
//! The refresh runs on its own task: dropping every waiter does not cancel it.

use futures::future::{BoxFuture, FutureExt, Shared};
use secrecy::SecretString;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tracing::{debug, warn};

use super::{
    cookies::CookieStore,
    credentials::{CredentialPair, SessionKey},
    error::AuthError,
};

const DEFAULT_REFRESH_TIMEOUT_SECONDS: u64 = 15;

pub type RefreshOutcome = Result<CredentialPair, AuthError>;

/// Shared, not-yet-resolved refresh for one session key.
pub type RefreshTicket = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Performs the actual refresh call. Implemented by the upstream client and by
/// test doubles.
pub trait TokenRefresher: Send + Sync + 'static {
    fn refresh(&self, refresh_token: Option<SecretString>) -> BoxFuture<'static, RefreshOutcome>;
}

struct TicketEntry {
    id: u64,
    ticket: RefreshTicket,
}

type TicketTable = Arc<Mutex<HashMap<SessionKey, TicketEntry>>>;

pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    tickets: TicketTable,
    next_id: AtomicU64,
    refresh_timeout: Duration,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.in_flight())
            .field("refresh_timeout", &self.refresh_timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            refresher,
            tickets: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECONDS),
        }
    }

    /// Upper bound for a single refresh; waiters get `UpstreamTimeout` past it.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Number of refreshes currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Return the in-flight ticket for this refresh credential, or start one.
    ///
    /// Lookup and registration happen under a single lock acquisition, so two
    /// callers can never both start a refresh for the same key.
    #[must_use]
    pub fn ticket(&self, refresh_token: Option<SecretString>) -> RefreshTicket {
        let key = SessionKey::from_refresh_token(refresh_token.as_ref());
        let mut tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = tickets.get(&key) {
            debug!("joining in-flight refresh");
            return entry.ticket.clone();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let refresh = self.refresher.refresh(refresh_token);
        let refresh_timeout = self.refresh_timeout;
        let table = Arc::clone(&self.tickets);
        let task_key = key.clone();

        // The task cannot remove its entry before it is inserted: removal needs
        // the lock held here.
        let handle = tokio::spawn(async move {
            // Dropped on completion, panic or abort alike.
            let _release = TicketRelease {
                table,
                key: task_key,
                id,
            };
            tokio::time::timeout(refresh_timeout, refresh)
                .await
                .unwrap_or_else(|_| {
                    warn!("refresh timed out after {:?}", refresh_timeout);
                    Err(AuthError::UpstreamTimeout)
                })
        });

        let ticket = async move {
            handle
                .await
                .unwrap_or_else(|err| Err(AuthError::RefreshAborted(err.to_string())))
        }
        .boxed()
        .shared();

        debug!("started refresh ticket {id}");
        tickets.insert(
            key,
            TicketEntry {
                id,
                ticket: ticket.clone(),
            },
        );

        ticket
    }

    /// Obtain a fresh access token for the exchange behind `cookies`.
    ///
    /// On success the new pair is written to `cookies` before the token is
    /// returned. On `SessionExpired` both cookies are cleared.
    ///
    /// # Errors
    /// Returns the shared refresh failure, e.g. `Unauthenticated` when no refresh
    /// cookie is present or `SessionExpired` when the upstream rejects it.
    pub async fn get_fresh_access_token(
        &self,
        cookies: &mut CookieStore,
    ) -> Result<SecretString, AuthError> {
        let ticket = self.ticket(cookies.refresh_token());

        match ticket.await {
            Ok(pair) => {
                cookies.persist(&pair);
                Ok(pair.access_token().clone())
            }
            Err(err) => {
                if matches!(err, AuthError::SessionExpired) {
                    cookies.clear();
                }
                Err(err)
            }
        }
    }
}

/// Removes the ticket it was created for, unless a newer ticket took its key.
struct TicketRelease {
    table: TicketTable,
    key: SessionKey,
    id: u64,
}

impl Drop for TicketRelease {
    fn drop(&mut self) {
        let mut tickets = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if tickets.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            tickets.remove(&self.key);
        }
    }
}
