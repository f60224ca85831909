//! Authentication session lifecycle.
//!
//! Split into the shared state holder ([`SessionStore`]) and the operations
//! facade ([`SessionManager`]). The store is also handed to the API client
//! so the bearer token and the 401 expiry behavior live in one place.

mod manager;
mod state;

pub use manager::{ERROR_DISPLAY_DURATION, SessionManager};
pub use state::{SessionEvent, SessionState, SessionStore};
