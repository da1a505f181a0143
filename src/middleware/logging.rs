//! Logging middleware
//!
//! Logs one line per request once the response is ready.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Logs method, path, status, and elapsed time for every request.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = started.elapsed();
    if status.is_server_error() {
        warn!("{} {} -> {} ({:?})", method, path, status.as_u16(), elapsed);
    } else {
        info!("{} {} -> {} ({:?})", method, path, status.as_u16(), elapsed);
    }
    response
}
