//! Session lifecycle operations against the remote auth API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use monarca_core::{User, UserDetails};

use crate::api::{ApiClient, ApiError, endpoints};
use crate::session::state::{ErrorSlot, SessionEvent, SessionState, SessionStore};

/// How long a transient error message stays visible before auto-clearing.
pub const ERROR_DISPLAY_DURATION: Duration = Duration::from_secs(3);

const MSG_PASSWORD_CHANGE_REQUIRED: &str = "A password change is required";
const MSG_BAD_CREDENTIALS: &str = "Incorrect username or password";
const MSG_LOGIN_FAILED: &str = "Could not sign in";
const MSG_RECOVERY_FAILED: &str = "Could not send the recovery email";
const MSG_RESET_FAILED: &str = "Could not reset the password";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_password: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    requires_password_change: bool,
    id_token: Option<String>,
    access_token: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

/// Owns the authentication lifecycle and exposes derived authorization state.
///
/// Network failures never escape `login` or `fetch_user_details`; they are
/// converted into state the UI reads. `forgot_password` and
/// `confirm_reset_password` additionally propagate their failure so callers
/// can chain their own handling.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    client: ApiClient,
}

impl SessionManager {
    /// Create a manager over a shared session store and API client.
    #[must_use]
    pub const fn new(store: SessionStore, client: ApiClient) -> Self {
        Self { store, client }
    }

    /// The shared session store.
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Snapshot of the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    /// Token present and no password change pending.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Subscribe to session lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.store.subscribe()
    }

    /// Authenticate against the remote API.
    ///
    /// Pass `new_password` when completing the forced password-change flow;
    /// it is forwarded alongside the original credentials in the same call.
    ///
    /// Outcomes land in session state: tokens and user on success, a
    /// password-change notice when the API demands one, or an error message
    /// that auto-clears after [`ERROR_DISPLAY_DURATION`]. Overlapping calls
    /// resolve last-response-wins; superseded responses are discarded.
    pub async fn login(&self, username: &str, password: &str, new_password: Option<&str>) {
        let generation = self.store.begin_request();
        self.store.commit(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = self
            .client
            .post_json::<LoginResponse, _>(
                endpoints::LOGIN,
                &LoginRequest {
                    username,
                    password,
                    new_password,
                },
            )
            .await;

        if !self.store.is_current(generation) {
            tracing::debug!(username, "Discarding stale login response");
            return;
        }

        match result {
            Ok(LoginResponse {
                requires_password_change: true,
                ..
            }) => {
                self.store.commit(|s| {
                    s.requires_password_change = true;
                    s.error = Some(MSG_PASSWORD_CHANGE_REQUIRED.to_owned());
                    s.is_loading = false;
                });
            }
            Ok(LoginResponse {
                id_token: Some(id_token),
                access_token,
                name,
                email,
                ..
            }) => {
                let user = User {
                    name: name.unwrap_or_default(),
                    username: username.to_owned(),
                    email: email.unwrap_or_default(),
                };
                self.store.commit(|s| {
                    s.id_token = Some(id_token);
                    s.access_token = access_token;
                    s.user = Some(user);
                    s.requires_password_change = false;
                    s.error = None;
                    s.is_loading = false;
                });
                tracing::info!(username, "Login succeeded");
            }
            // No token and no password-change flag: leave the session as-is.
            Ok(_) => {
                self.store.commit(|s| s.is_loading = false);
            }
            Err(e) => {
                let message = match &e {
                    ApiError::Unauthorized => MSG_BAD_CREDENTIALS.to_owned(),
                    other => other
                        .server_message()
                        .map_or_else(|| MSG_LOGIN_FAILED.to_owned(), str::to_owned),
                };
                tracing::debug!(username, error = %e, "Login failed");
                self.store.commit(|s| {
                    s.error = Some(message);
                    s.is_loading = false;
                });
                self.schedule_error_clear(ErrorSlot::Login);
            }
        }
    }

    /// Clear the session. The cart is a separate component and is untouched.
    pub fn logout(&self) {
        // In-flight auth responses must not resurrect the session.
        self.store.begin_request();
        self.store.commit(|s| {
            s.id_token = None;
            s.access_token = None;
            s.user = None;
            s.user_details = None;
            s.error = None;
            s.requires_password_change = false;
            s.is_loading = false;
            s.forgot_password_error = None;
            s.reset_password_success = false;
        });
        tracing::info!("Logged out");
    }

    /// Request a password-recovery email.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` after recording it in the forgot-password
    /// error slice (which auto-clears), so callers can also show their own
    /// failure UI.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.store.commit(|s| {
            s.forgot_password_loading = true;
            s.forgot_password_error = None;
        });

        let result = self
            .client
            .post_json::<serde_json::Value, _>(
                endpoints::RECOVER_PASSWORD,
                &serde_json::json!({ "email": email }),
            )
            .await;

        match result {
            Ok(_) => {
                self.store.commit(|s| s.forgot_password_loading = false);
                Ok(())
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .map_or_else(|| MSG_RECOVERY_FAILED.to_owned(), str::to_owned);
                self.store.commit(|s| {
                    s.forgot_password_error = Some(message);
                    s.forgot_password_loading = false;
                });
                self.schedule_error_clear(ErrorSlot::ForgotPassword);
                Err(e)
            }
        }
    }

    /// Complete a password reset with the emailed confirmation code.
    ///
    /// On success sets the one-shot flag read by
    /// [`take_reset_password_success`](Self::take_reset_password_success).
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` after recording it in the login error slice
    /// (which auto-clears).
    pub async fn confirm_reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        self.store.commit(|s| {
            s.is_loading = true;
            s.error = None;
            s.reset_password_success = false;
        });

        let result = self
            .client
            .post_json::<serde_json::Value, _>(
                endpoints::CONFIRM_PASSWORD,
                &serde_json::json!({
                    "email": email,
                    "code": code,
                    "newPassword": new_password,
                }),
            )
            .await;

        match result {
            Ok(_) => {
                self.store.commit(|s| {
                    s.reset_password_success = true;
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .map_or_else(|| MSG_RESET_FAILED.to_owned(), str::to_owned);
                self.store.commit(|s| {
                    s.error = Some(message);
                    s.is_loading = false;
                });
                self.schedule_error_clear(ErrorSlot::Login);
                Err(e)
            }
        }
    }

    /// Consume the one-shot reset-succeeded flag.
    pub fn take_reset_password_success(&self) -> bool {
        let mut taken = false;
        self.store.commit(|s| {
            taken = std::mem::take(&mut s.reset_password_success);
        });
        taken
    }

    /// Fetch the extended profile of the logged-in user.
    ///
    /// No-op when unauthenticated (no request is made). Failures are logged
    /// and swallowed; this is a soft-fail read.
    pub async fn fetch_user_details(&self) {
        if !self.store.is_authenticated() {
            return;
        }
        self.store.commit(|s| s.is_loading = true);

        match self.client.get_json::<UserDetails>(endpoints::USER).await {
            Ok(details) => {
                self.store.commit(|s| {
                    s.user_details = Some(details);
                    s.error = None;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch user details");
                self.store.commit(|s| s.is_loading = false);
            }
        }
    }

    /// Replace the stored user identity.
    pub fn set_user(&self, user: User) {
        self.store.commit(|s| s.user = Some(user));
    }

    /// Clear the login-slice error immediately.
    pub fn clear_error(&self) {
        self.store.commit(|s| s.error = None);
    }

    /// Arm the auto-clear timer for the freshest error in `slot`.
    fn schedule_error_clear(&self, slot: ErrorSlot) {
        let epoch = self.store.note_error(slot);
        let store = self.store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ERROR_DISPLAY_DURATION).await;
            store.clear_error_if_current(slot, epoch);
        });
    }
}
