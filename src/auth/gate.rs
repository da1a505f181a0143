//! Request admission
//!
//! Decides, per request, whether a request may reach a protected handler.
//! The decision is recomputed every time; nothing about a client is
//! remembered between requests except the tokens themselves.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use log::debug;

use crate::auth::tokens::TokenStore;
use crate::error::AuthError;
use crate::server::state::AppState;

/// Cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth_token";
/// Login page.
pub const LOGIN_PATH: &str = "/login";
/// Login API endpoint.
pub const LOGIN_API_PATH: &str = "/api/login";

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of the admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    RedirectToLogin,
}

/// Credentials a request presented, if any.
#[derive(Debug, Default, Clone, Copy)]
pub struct PresentedCredentials<'a> {
    pub cookie: Option<&'a str>,
    pub authorization: Option<&'a str>,
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    authorization.strip_prefix(BEARER_PREFIX)
}

pub fn is_login_surface(path: &str) -> bool {
    path == LOGIN_PATH || path == LOGIN_API_PATH
}

/// Admission policy, in order:
/// 1. no credentials configured: admit;
/// 2. a valid token in the cookie or bearer header: admit;
/// 3. the login surface itself: admit;
/// 4. otherwise: redirect to login.
pub fn admit(
    auth_enabled: bool,
    presented: PresentedCredentials<'_>,
    path: &str,
    tokens: &dyn TokenStore,
) -> Decision {
    if !auth_enabled {
        return Decision::Admit;
    }

    if presented.cookie.is_some_and(|token| tokens.validate(token)) {
        return Decision::Admit;
    }

    if presented
        .authorization
        .and_then(bearer_token)
        .is_some_and(|token| tokens.validate(token))
    {
        return Decision::Admit;
    }

    if is_login_surface(path) {
        return Decision::Admit;
    }

    Decision::RedirectToLogin
}

/// Middleware applying [`admit`] to every routed request.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let decision = {
        let presented = PresentedCredentials {
            cookie: jar.get(AUTH_COOKIE).map(|c| c.value()),
            authorization: req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok()),
        };
        admit(
            state.credentials.is_some(),
            presented,
            req.uri().path(),
            state.tokens.as_ref(),
        )
    };

    match decision {
        Decision::Admit => next.run(req).await,
        Decision::RedirectToLogin => {
            debug!("Unauthenticated request to {}", req.uri().path());
            AuthError::Unauthenticated.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::InMemoryTokenStore;
    use std::time::Duration;

    fn store_with_token() -> (InMemoryTokenStore, String) {
        let store = InMemoryTokenStore::new();
        let token = store.issue(Duration::from_secs(60)).token;
        (store, token)
    }

    #[test]
    fn disabled_auth_admits_everything() {
        let (store, _) = store_with_token();
        let decision = admit(false, PresentedCredentials::default(), "/download", &store);
        assert_eq!(decision, Decision::Admit);
    }

    #[test]
    fn cookie_and_bearer_are_equally_trusted() {
        let (store, token) = store_with_token();
        let header = format!("Bearer {token}");

        let via_cookie = PresentedCredentials {
            cookie: Some(token.as_str()),
            authorization: None,
        };
        let via_header = PresentedCredentials {
            cookie: None,
            authorization: Some(header.as_str()),
        };
        assert_eq!(admit(true, via_cookie, "/list", &store), Decision::Admit);
        assert_eq!(admit(true, via_header, "/list", &store), Decision::Admit);
    }

    #[test]
    fn invalid_cookie_falls_through_to_bearer() {
        let (store, token) = store_with_token();
        let header = format!("Bearer {token}");
        let presented = PresentedCredentials {
            cookie: Some("stale"),
            authorization: Some(header.as_str()),
        };
        assert_eq!(admit(true, presented, "/list", &store), Decision::Admit);
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let (store, token) = store_with_token();
        let header = format!("Basic {token}");
        let presented = PresentedCredentials {
            cookie: None,
            authorization: Some(header.as_str()),
        };
        assert_eq!(admit(true, presented, "/list", &store), Decision::RedirectToLogin);
    }

    #[test]
    fn login_surface_stays_reachable() {
        let (store, _) = store_with_token();
        let none = PresentedCredentials::default();
        assert_eq!(admit(true, none, LOGIN_PATH, &store), Decision::Admit);
        assert_eq!(admit(true, none, LOGIN_API_PATH, &store), Decision::Admit);
        assert_eq!(admit(true, none, "/", &store), Decision::RedirectToLogin);
    }

    #[test]
    fn revoked_token_is_redirected() {
        let (store, token) = store_with_token();
        store.revoke(&token);
        let presented = PresentedCredentials {
            cookie: Some(token.as_str()),
            authorization: None,
        };
        assert_eq!(admit(true, presented, "/list", &store), Decision::RedirectToLogin);
    }
}
