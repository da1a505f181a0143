//! Session token storage
//!
//! Tokens are opaque bearer strings mapped to an expiry instant. Expired
//! records are not swept in the background; the first lookup that finds one
//! evicts it.

use parking_lot::RwLock;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Source of wall-clock time for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// The real UTC clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A freshly issued token, as returned to the client on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Issues, checks, and revokes session tokens.
pub trait TokenStore: Send + Sync {
    /// Creates a token valid for `ttl` from now.
    fn issue(&self, ttl: Duration) -> IssuedToken;

    /// Returns true iff `token` is known and not yet expired.
    fn validate(&self, token: &str) -> bool;

    /// Forgets `token`. Unknown tokens are ignored.
    fn revoke(&self, token: &str);
}

/// Process-local token store guarded by a reader/writer lock.
pub struct InMemoryTokenStore {
    records: RwLock<HashMap<String, OffsetDateTime>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of records currently held, expired or not.
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn issue(&self, ttl: Duration) -> IssuedToken {
        let token = generate_token();
        let expires_at = expiry_after(self.clock.now(), ttl);
        self.records.write().insert(token.clone(), expires_at);
        IssuedToken { token, expires_at }
    }

    fn validate(&self, token: &str) -> bool {
        let Some(expires_at) = self.records.read().get(token).copied() else {
            return false;
        };

        let now = self.clock.now();
        if now < expires_at {
            return true;
        }

        // Re-check under the write lock: the record may have been replaced
        // or revoked since the read lock was released.
        let mut records = self.records.write();
        if records.get(token).is_some_and(|exp| *exp <= now) {
            records.remove(token);
        }
        false
    }

    fn revoke(&self, token: &str) {
        self.records.write().remove(token);
    }
}

/// `now + ttl`, saturating at the latest representable instant.
fn expiry_after(now: OffsetDateTime, ttl: Duration) -> OffsetDateTime {
    time::Duration::try_from(ttl)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}

/// 32 bytes from the OS CSPRNG, hashed with SHA-256 and hex encoded.
fn generate_token() -> String {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    hex::encode(Sha256::digest(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::thread;

    struct ManualClock(Mutex<OffsetDateTime>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(OffsetDateTime::UNIX_EPOCH)))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock()
        }
    }

    #[test]
    fn tokens_are_64_hex_chars_and_distinct() {
        let store = InMemoryTokenStore::new();
        let a = store.issue(Duration::from_secs(60));
        let b = store.issue(Duration::from_secs(60));
        assert_eq!(a.token.len(), 64);
        assert!(a.token.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn issued_token_validates_until_expiry() {
        let clock = ManualClock::new();
        let store = InMemoryTokenStore::with_clock(clock.clone());
        let issued = store.issue(Duration::from_secs(60));

        assert_eq!(issued.expires_at, OffsetDateTime::UNIX_EPOCH + Duration::from_secs(60));
        assert!(store.validate(&issued.token));

        clock.advance(Duration::from_secs(59));
        assert!(store.validate(&issued.token));

        clock.advance(Duration::from_secs(2));
        assert!(!store.validate(&issued.token));
    }

    #[test]
    fn expired_token_is_evicted_by_lookup() {
        let clock = ManualClock::new();
        let store = InMemoryTokenStore::with_clock(clock.clone());
        let issued = store.issue(Duration::from_secs(1));
        let keep = store.issue(Duration::from_secs(3600));

        clock.advance(Duration::from_secs(5));
        assert_eq!(store.record_count(), 2);
        assert!(!store.validate(&issued.token));
        assert_eq!(store.record_count(), 1);
        assert!(store.validate(&keep.token));
    }

    #[test]
    fn oversized_lifetime_saturates_instead_of_overflowing() {
        let store = InMemoryTokenStore::new();
        let issued = store.issue(Duration::from_secs(u64::MAX / 2));

        assert_eq!(issued.expires_at, PrimitiveDateTime::MAX.assume_utc());
        assert!(store.validate(&issued.token));
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let store = InMemoryTokenStore::new();
        assert!(!store.validate("deadbeef"));
        assert!(!store.validate(""));
    }

    #[test]
    fn revoke_is_idempotent() {
        let store = InMemoryTokenStore::new();
        let issued = store.issue(Duration::from_secs(60));

        store.revoke(&issued.token);
        assert!(!store.validate(&issued.token));
        store.revoke(&issued.token);
        store.revoke("never-issued");
        assert_eq!(store.record_count(), 0);
    }

    #[test]
    fn concurrent_readers_see_whole_records() {
        let store = Arc::new(InMemoryTokenStore::new());
        let known = store.issue(Duration::from_secs(3600));

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let token = known.token.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        assert!(store.validate(&token));
                    }
                })
            })
            .collect();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..500)
                    .map(|_| store.issue(Duration::from_secs(3600)))
                    .collect::<Vec<_>>()
            })
        };

        for reader in readers {
            reader.join().unwrap();
        }
        for issued in writer.join().unwrap() {
            assert!(store.validate(&issued.token));
        }
        assert_eq!(store.record_count(), 501);
    }
}
