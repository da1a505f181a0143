//! Authentication system
//!
//! Handles credential validation, session tokens, and request admission.

pub mod credentials;
pub mod gate;
pub mod session;
pub mod tokens;

pub use credentials::StaticCredentials;
pub use gate::{AUTH_COOKIE, Decision, LOGIN_API_PATH, LOGIN_PATH, admit, require_auth};
pub use session::SessionPolicy;
pub use tokens::{Clock, InMemoryTokenStore, IssuedToken, SystemClock, TokenStore};
