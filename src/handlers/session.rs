//! Login and logout handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use log::{info, warn};
use serde::Deserialize;

use crate::auth::{AUTH_COOKIE, IssuedToken, LOGIN_PATH};
use crate::error::AuthError;
use crate::server::state::AppState;

const LOGIN_PAGE: &str = include_str!("login.html");

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// `GET /login`
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// `POST /api/login`: exchanges the static credentials for a session token.
///
/// The token is returned in the body and also set as the session cookie.
pub async fn api_login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<IssuedToken>), AuthError> {
    let request: LoginRequest = serde_json::from_slice(&body)
        .map_err(|e| AuthError::MalformedRequest(e.to_string()))?;

    let credentials = state.credentials.as_ref().ok_or(AuthError::Disabled)?;
    if let Err(e) = credentials.verify(&request.username, &request.password) {
        warn!("Failed login attempt for user {:?}", request.username);
        return Err(e);
    }

    let ttl = state.sessions.ttl_for(request.remember_me);
    let issued = state.tokens.issue(ttl);
    info!(
        "User {} logged in (session expires {})",
        credentials.username(),
        issued.expires_at
    );

    let max_age = time::Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
    let cookie = Cookie::build((AUTH_COOKIE, issued.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age);

    Ok((jar.add(cookie), Json(issued)))
}

/// `GET /logout`: revokes the cookie's token and clears the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        state.tokens.revoke(cookie.value());
        info!("Session logged out");
    }

    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (StatusCode::FOUND, jar, [(header::LOCATION, LOGIN_PATH)]).into_response()
}
