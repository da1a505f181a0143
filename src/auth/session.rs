//! Session lifetime policy
//!
//! Picks a token lifetime at login; the token store itself does not care.

use std::time::Duration;

/// One day.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Thirty days, used when the client asks to be remembered.
pub const REMEMBERED_SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub default_ttl: Duration,
    pub remembered_ttl: Duration,
}

impl SessionPolicy {
    pub fn ttl_for(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.remembered_ttl
        } else {
            self.default_ttl
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_SESSION_TTL,
            remembered_ttl: REMEMBERED_SESSION_TTL,
        }
    }
}
