//! Credential storage and management
//!
//! The server has at most one static username/password pair, supplied
//! through configuration. Without one, authentication is disabled.

use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// The single configured login.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    /// Returns `None` unless both halves of the pair are non-empty.
    pub fn from_pair(username: &str, password: &str) -> Option<Self> {
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Checks a login attempt without short-circuiting on the first mismatch.
    pub fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let user_ok = constant_time_equal(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_equal(self.password.as_bytes(), password.as_bytes());
        if user_ok & pass_ok {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.ct_eq(b))
}
