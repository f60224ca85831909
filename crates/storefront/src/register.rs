//! Account registration with client-side validation.
//!
//! Format checks run before submission; a request that fails validation
//! never reaches the API. Unlike the login/reset slices, a registration
//! error stays visible until cleared explicitly.

use std::sync::{Mutex, MutexGuard, PoisonError};

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::api::{ApiClient, ApiError, endpoints};

const MSG_REGISTER_FAILED: &str = "Could not register the account";
const MSG_INVALID_EMAIL: &str = "Enter a valid email address";
const MSG_INVALID_PHONE: &str = "Enter a valid phone number (7-15 digits)";
const MSG_INVALID_PASSWORD: &str =
    "Password needs at least 8 characters with upper and lower case, a digit and a special character";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap()
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r"^[0-9]{7,15}$").unwrap()
});

/// Password must be at least 8 chars with upper, lower, digit and one of
/// `@$!%*?&`.
#[must_use]
pub fn is_password_valid(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| "@$!%*?&".contains(c))
}

/// Basic shape check: something@something.something, no whitespace.
#[must_use]
pub fn is_email_valid(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 7 to 15 digits, nothing else.
#[must_use]
pub fn is_phone_valid(phone_number: &str) -> bool {
    PHONE_RE.is_match(phone_number)
}

/// Transient registration state read by the sign-up page.
#[derive(Debug, Clone, Default)]
pub struct RegisterState {
    /// A registration call is in flight.
    pub is_loading: bool,
    /// User-facing validation or API error.
    pub error: Option<String>,
    /// The account was created.
    pub success: bool,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    username: &'a str,
    email: &'a str,
    password: &'a str,
    // The API expects snake_case here, unlike the camelCase auth payloads.
    phone_number: &'a str,
}

/// Registration store. Holds no durable state.
pub struct RegisterStore {
    client: ApiClient,
    state: Mutex<RegisterState>,
}

impl RegisterStore {
    /// Create a registration store over the shared API client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Mutex::new(RegisterState::default()),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RegisterState {
        self.lock().clone()
    }

    /// Create an account.
    ///
    /// Validation failures set the error state without making a request.
    /// API failures set the error state from the server message when one is
    /// provided. Success sets the `success` flag.
    pub async fn register(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
        phone_number: &str,
    ) {
        if let Some(message) = validate(email, password, phone_number) {
            let mut state = self.lock();
            state.error = Some(message.to_owned());
            state.success = false;
            return;
        }

        {
            let mut state = self.lock();
            state.is_loading = true;
            state.error = None;
        }

        let result = self
            .client
            .post_json::<serde_json::Value, _>(
                endpoints::REGISTER,
                &RegisterRequest {
                    name,
                    username,
                    email,
                    password,
                    phone_number,
                },
            )
            .await;

        let mut state = self.lock();
        state.is_loading = false;
        match result {
            Ok(_) => {
                state.success = true;
                state.error = None;
                tracing::info!(username, "Registration succeeded");
            }
            Err(e) => {
                tracing::debug!(username, error = %e, "Registration failed");
                state.error = Some(registration_message(&e));
            }
        }
    }

    /// Clear the error message.
    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    /// Reset to the initial state.
    pub fn reset(&self) {
        *self.lock() = RegisterState::default();
    }

    fn lock(&self) -> MutexGuard<'_, RegisterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(email: &str, password: &str, phone_number: &str) -> Option<&'static str> {
    if !is_email_valid(email) {
        return Some(MSG_INVALID_EMAIL);
    }
    if !is_password_valid(password) {
        return Some(MSG_INVALID_PASSWORD);
    }
    if !is_phone_valid(phone_number) {
        return Some(MSG_INVALID_PHONE);
    }
    None
}

fn registration_message(e: &ApiError) -> String {
    e.server_message()
        .map_or_else(|| MSG_REGISTER_FAILED.to_owned(), str::to_owned)
}
