//! Shared session state.
//!
//! [`SessionStore`] owns the authentication state behind an `Arc`, persists
//! it through a [`Storage`] backend, and broadcasts [`SessionEvent`]s so the
//! presentation layer can react (e.g. navigate to the login page) without
//! this crate knowing anything about routing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use monarca_core::{User, UserDetails};

use crate::storage::{Storage, StorageError, keys};

/// Capacity of the session event channel. Events are tiny and subscribers
/// are expected to drain promptly.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Notifications emitted by the session component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session was invalidated by the server (a 401 outside the login
    /// flow). Subscribers should navigate to the login page if they are not
    /// already there.
    Expired,
}

/// The full in-memory authentication state.
///
/// `error`, `is_loading` and the forgot-password slice are transient UI
/// state; only the token/user subset is persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Identity token returned by the auth API.
    pub id_token: Option<String>,
    /// Access token returned by the auth API.
    pub access_token: Option<String>,
    /// Identity of the logged-in user.
    pub user: Option<User>,
    /// Extended profile from `GET /user`.
    pub user_details: Option<UserDetails>,
    /// A login or reset call is in flight.
    pub is_loading: bool,
    /// User-facing error from the login/reset slice.
    pub error: Option<String>,
    /// The API demanded a password change before issuing tokens.
    pub requires_password_change: bool,
    /// A forgot-password call is in flight.
    pub forgot_password_loading: bool,
    /// User-facing error from the forgot-password slice.
    pub forgot_password_error: Option<String>,
    /// One-shot flag set when a password reset succeeded.
    pub reset_password_success: bool,
}

/// The subset of session state written to durable storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    token: Option<String>,
    access_token: Option<String>,
    user: Option<User>,
    #[serde(default)]
    requires_password_change: bool,
}

/// Which transient error slice an auto-clear timer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSlot {
    /// `SessionState::error` (login / reset password).
    Login,
    /// `SessionState::forgot_password_error`.
    ForgotPassword,
}

/// Shared, persisted session state.
///
/// Cheaply cloneable; all clones observe the same state. Mutations are full
/// snapshot commits under a short-lived lock, never held across an await.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    state: Mutex<SessionState>,
    storage: Arc<dyn Storage>,
    hydrated: AtomicBool,
    /// Request generation for last-response-wins on overlapping auth calls.
    generation: AtomicU64,
    /// Epochs guarding the error auto-clear timers.
    login_error_epoch: AtomicU64,
    forgot_error_epoch: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create an empty, not-yet-hydrated session over a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionStoreInner {
                state: Mutex::new(SessionState::default()),
                storage,
                hydrated: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                login_error_epoch: AtomicU64::new(0),
                forgot_error_epoch: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Restore persisted session state and mark hydration complete.
    ///
    /// A corrupt persisted record is discarded with a warning; the session
    /// then starts anonymous. Hydration completes in every case, which is
    /// what gates the forced-logout behavior on external 401s.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself cannot be read.
    pub fn hydrate(&self) -> Result<(), StorageError> {
        let loaded = self.inner.storage.load(keys::AUTH);
        match loaded {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedSession>(&raw) {
                Ok(persisted) => {
                    let mut state = self.lock();
                    state.id_token = persisted.token;
                    state.access_token = persisted.access_token;
                    state.user = persisted.user;
                    state.requires_password_change = persisted.requires_password_change;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding corrupt persisted session");
                }
            },
            Ok(None) => {}
            Err(e) => {
                self.inner.hydrated.store(true, Ordering::SeqCst);
                return Err(e);
            }
        }
        self.inner.hydrated.store(true, Ordering::SeqCst);
        tracing::debug!("Session hydration complete");
        Ok(())
    }

    /// Whether persisted state has been restored.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.inner.hydrated.load(Ordering::SeqCst)
    }

    /// Current identity token, if any.
    #[must_use]
    pub fn id_token(&self) -> Option<String> {
        self.lock().id_token.clone()
    }

    /// Token present and no password change pending.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let state = self.lock();
        state.id_token.is_some() && !state.requires_password_change
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().clone()
    }

    /// Subscribe to session lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Apply a mutation and persist the durable subset.
    pub(crate) fn commit(&self, mutate: impl FnOnce(&mut SessionState)) {
        let persisted = {
            let mut state = self.lock();
            mutate(&mut state);
            PersistedSession {
                token: state.id_token.clone(),
                access_token: state.access_token.clone(),
                user: state.user.clone(),
                requires_password_change: state.requires_password_change,
            }
        };
        self.persist(&persisted);
    }

    /// Start an auth request; returns its generation token.
    pub(crate) fn begin_request(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `generation` is still the newest auth request. A stale
    /// response (superseded by a later call or by a logout) must be
    /// discarded instead of committing.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    /// Record a new error in `slot`, returning the epoch an auto-clear
    /// timer must present to clear it.
    pub(crate) fn note_error(&self, slot: ErrorSlot) -> u64 {
        self.epoch_for(slot).fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Clear the error in `slot` unless a newer error has replaced it.
    pub(crate) fn clear_error_if_current(&self, slot: ErrorSlot, epoch: u64) {
        if self.epoch_for(slot).load(Ordering::SeqCst) != epoch {
            return;
        }
        self.commit(|state| match slot {
            ErrorSlot::Login => state.error = None,
            ErrorSlot::ForgotPassword => state.forgot_password_error = None,
        });
    }

    /// Force-logout after an externally observed 401.
    ///
    /// No-op until hydration has completed, so a user who is still mid-load
    /// is never logged out by a stray early response.
    pub(crate) fn expire(&self) {
        if !self.is_hydrated() {
            tracing::debug!("Ignoring 401 before session hydration");
            return;
        }
        self.begin_request();
        self.commit(|state| {
            state.id_token = None;
            state.access_token = None;
            state.user = None;
            state.user_details = None;
            state.error = None;
            state.requires_password_change = false;
            state.is_loading = false;
        });
        tracing::info!("Session expired by server response");
        let _ = self.inner.events.send(SessionEvent::Expired);
    }

    fn persist(&self, persisted: &PersistedSession) {
        let serialized = match serde_json::to_string(persisted) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize session state");
                return;
            }
        };
        if let Err(e) = self.inner.storage.save(keys::AUTH, &serialized) {
            tracing::warn!(error = %e, "Failed to persist session state");
        }
    }

    fn epoch_for(&self, slot: ErrorSlot) -> &AtomicU64 {
        match slot {
            ErrorSlot::Login => &self.inner.login_error_epoch,
            ErrorSlot::ForgotPassword => &self.inner.forgot_error_epoch,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store_with(storage: Arc<MemoryStorage>) -> SessionStore {
        SessionStore::new(storage)
    }

    #[test]
    fn test_starts_anonymous_and_unhydrated() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        assert!(!store.is_hydrated());
        assert!(!store.is_authenticated());
        assert_eq!(store.id_token(), None);
    }

    #[test]
    fn test_hydrate_restores_persisted_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .save(
                keys::AUTH,
                r#"{
                    "token": "abc",
                    "accessToken": "xyz",
                    "user": { "name": "Juan", "username": "juan", "email": "juan@x.com" },
                    "requiresPasswordChange": false
                }"#,
            )
            .unwrap();

        let store = store_with(storage);
        store.hydrate().unwrap();

        assert!(store.is_hydrated());
        assert!(store.is_authenticated());
        assert_eq!(store.id_token().as_deref(), Some("abc"));
        assert_eq!(store.state().user.unwrap().name, "Juan");
    }

    #[test]
    fn test_hydrate_discards_corrupt_record() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(keys::AUTH, "not json").unwrap();

        let store = store_with(storage);
        store.hydrate().unwrap();

        assert!(store.is_hydrated());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_commit_persists_durable_subset() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.commit(|s| {
            s.id_token = Some("abc".to_owned());
            s.error = Some("transient".to_owned());
        });

        let raw = storage.load(keys::AUTH).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["token"], "abc");
        // Transient fields never reach storage.
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_authenticated_requires_token_and_no_pending_change() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        assert!(!store.is_authenticated());

        store.commit(|s| s.id_token = Some("abc".to_owned()));
        assert!(store.is_authenticated());

        store.commit(|s| s.requires_password_change = true);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_expire_is_gated_on_hydration() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.commit(|s| s.id_token = Some("abc".to_owned()));
        let mut events = store.subscribe();

        // Not hydrated yet: 401 must not log the user out.
        store.expire();
        assert!(store.is_authenticated());
        assert!(events.try_recv().is_err());

        store.hydrate().unwrap();
        store.expire();
        assert!(!store.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    }

    #[test]
    fn test_expire_invalidates_inflight_generations() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.hydrate().unwrap();

        let generation = store.begin_request();
        assert!(store.is_current(generation));
        store.expire();
        assert!(!store.is_current(generation));
    }

    #[test]
    fn test_error_epoch_guards_auto_clear() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.commit(|s| s.error = Some("first".to_owned()));
        let first = store.note_error(ErrorSlot::Login);

        // A newer error supersedes the first timer.
        store.commit(|s| s.error = Some("second".to_owned()));
        let second = store.note_error(ErrorSlot::Login);

        store.clear_error_if_current(ErrorSlot::Login, first);
        assert_eq!(store.state().error.as_deref(), Some("second"));

        store.clear_error_if_current(ErrorSlot::Login, second);
        assert_eq!(store.state().error, None);
    }
}
