//! Shared request state
//!
//! Everything a handler needs, cloned cheaply into each request.

use std::sync::Arc;

use crate::auth::{SessionPolicy, StaticCredentials, TokenStore};
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    /// `None` disables authentication entirely.
    pub credentials: Option<Arc<StaticCredentials>>,
    pub tokens: Arc<dyn TokenStore>,
    pub sessions: SessionPolicy,
}

impl AppState {
    pub fn new(
        storage: Storage,
        credentials: Option<StaticCredentials>,
        tokens: Arc<dyn TokenStore>,
        sessions: SessionPolicy,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            credentials: credentials.map(Arc::new),
            tokens,
            sessions,
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.credentials.is_some()
    }
}
