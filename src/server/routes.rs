//! Route table

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::{LOGIN_API_PATH, LOGIN_PATH, require_auth};
use crate::handlers;
use crate::middleware::log_requests;
use crate::server::state::AppState;

/// Builds the application router.
///
/// The login surface and logout are public; everything else sits behind
/// [`require_auth`]. `upload_limit` caps upload request bodies in bytes.
pub fn build_router(state: AppState, upload_limit: usize) -> Router {
    let protected = Router::new()
        .route("/", get(handlers::list))
        .route("/list", get(handlers::list))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/download", get(handlers::download))
        .route("/delete", get(handlers::delete).post(handlers::delete))
        .route("/create", post(handlers::create))
        .route("/rename", post(handlers::rename))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route(LOGIN_PATH, get(handlers::login_page))
        .route(LOGIN_API_PATH, post(handlers::api_login))
        .route("/logout", get(handlers::logout));

    protected
        .merge(public)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}
