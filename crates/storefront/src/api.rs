//! HTTP client for the remote storefront API.
//!
//! JSON over HTTPS against a configured base URL. A bearer token is attached
//! automatically whenever the session holds one, and any 401 outside the
//! login flow expires the session (see [`SessionStore::expire`]).
//!
//! Every remote failure is mapped into [`ApiError`]; the `Display` string of
//! each variant is the user-facing message the stores surface.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::StorefrontConfig;
use crate::session::SessionStore;

/// Endpoint paths consumed by the stores.
pub mod endpoints {
    /// Login (also carries the forced password change).
    pub const LOGIN: &str = "auth/login";
    /// Request a password-recovery email.
    pub const RECOVER_PASSWORD: &str = "auth/recover-password";
    /// Confirm a password reset with the emailed code.
    pub const CONFIRM_PASSWORD: &str = "auth/confirm-password";
    /// Create an account.
    pub const REGISTER: &str = "auth/register";
    /// Extended profile of the logged-in user.
    pub const USER: &str = "user";
}

/// Errors from the remote API, mapped by response status.
///
/// `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 with an optional server-provided message.
    #[error("{0}")]
    BadRequest(String),

    /// 401.
    #[error("Invalid credentials")]
    Unauthorized,

    /// 403.
    #[error("Access denied")]
    Forbidden,

    /// 404.
    #[error("Resource not found")]
    NotFound,

    /// Any 5xx.
    #[error("Server error")]
    Server,

    /// No response was received (connect failure, timeout, aborted body).
    #[error("No response received from the server")]
    Transport(#[source] reqwest::Error),

    /// A successful response that could not be decoded.
    #[error("Response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Any other failure, with the server message when one was provided.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Map a non-success HTTP status (plus any server message) to an error.
    fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::BAD_REQUEST => {
                Self::BadRequest(message.unwrap_or_else(|| "Invalid request".to_owned()))
            }
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            s if s.is_server_error() => Self::Server,
            _ => Self::Other(message.unwrap_or_else(|| "An unexpected error occurred".to_owned())),
        }
    }

    /// The message the server attached to the failure, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::BadRequest(msg) | Self::Other(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

/// The `{ "data": [...] }` envelope wrapping catalog responses.
#[derive(Debug, serde::Deserialize)]
pub struct Data<T> {
    /// The enveloped payload.
    pub data: T,
}

/// Client for the remote storefront API.
///
/// Cheaply cloneable; all clones share one connection pool and one session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: url::Url,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
                session,
            }),
        })
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` per the status taxonomy.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    /// `POST` a JSON body and decode a JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` per the status taxonomy.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    async fn execute<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Other(e.to_string()))?;

        let mut request = self.inner.http.request(method.clone(), url);
        if let Some(token) = self.inner.session.id_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "API request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            // Some endpoints reply with an empty body on success.
            let payload = if text.trim().is_empty() { "null" } else { &text };
            return Ok(serde_json::from_str(payload)?);
        }

        // An expired or revoked token anywhere outside the login flow ends
        // the session; the login endpoint's own 401 means bad credentials.
        if status == StatusCode::UNAUTHORIZED && !is_login_path(path) {
            self.inner.session.expire();
        }

        let error = ApiError::from_status(status, extract_message(&text));
        tracing::debug!(%status, path, error = %error, "API request failed");
        Err(error)
    }
}

/// Whether `path` belongs to the login flow.
fn is_login_path(path: &str) -> bool {
    path.contains("login")
}

/// Pull a `{ "message": "..." }` field out of an error body, if present.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_taxonomy() {
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, None),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, None),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, None),
            ApiError::Forbidden
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, None),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, None),
            ApiError::Server
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, None),
            ApiError::Server
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, None),
            ApiError::Other(_)
        ));
    }

    #[test]
    fn test_server_message_is_preferred() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            Some("username already taken".to_owned()),
        );
        assert_eq!(err.to_string(), "username already taken");
        assert_eq!(err.server_message(), Some("username already taken"));

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, None);
        assert_eq!(err.to_string(), "Invalid request");
    }

    #[test]
    fn test_fixed_user_messages() {
        assert_eq!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, None).to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            ApiError::from_status(StatusCode::FORBIDDEN, None).to_string(),
            "Access denied"
        );
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, None).to_string(),
            "Resource not found"
        );
        assert_eq!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, None).to_string(),
            "Server error"
        );
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"message":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(extract_message(r#"{"error":"nope"}"#), None);
        assert_eq!(extract_message("not json"), None);
    }

    #[test]
    fn test_is_login_path() {
        assert!(is_login_path(endpoints::LOGIN));
        assert!(!is_login_path(endpoints::RECOVER_PASSWORD));
        assert!(!is_login_path(endpoints::USER));
        assert!(!is_login_path("categories"));
    }
}
