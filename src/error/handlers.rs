//! Error handlers
//!
//! Maps file server errors onto HTTP responses.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{debug, error, warn};
use serde_json::json;

use crate::auth::LOGIN_PATH;
use crate::error::types::{AuthError, FileServerError, PathError, StorageError};

/// Convert error to HTTP status code
pub fn error_to_status(err: &FileServerError) -> StatusCode {
    match err {
        FileServerError::Path(_) => StatusCode::BAD_REQUEST,
        FileServerError::Range(_) => StatusCode::RANGE_NOT_SATISFIABLE,
        FileServerError::Auth(e) => auth_status(e),
        FileServerError::Storage(e) => storage_status(e),
        FileServerError::Cert(_) | FileServerError::Config(_) | FileServerError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Unauthenticated => StatusCode::FOUND,
        AuthError::InvalidCredentials | AuthError::Disabled => StatusCode::UNAUTHORIZED,
        AuthError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
    }
}

fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::IsDirectory(_)
        | StorageError::NotADirectory(_)
        | StorageError::AlreadyExists(_)
        | StorageError::InvalidName(_)
        | StorageError::InvalidUpload(_)
        | StorageError::RootProtected
        | StorageError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log an error at a level matching its severity
pub fn handle_error(err: &FileServerError) {
    match err {
        FileServerError::Path(PathError::Escape(p))
        | FileServerError::Storage(StorageError::InvalidPath(PathError::Escape(p))) => {
            warn!("Rejected path outside served root: {:?}", p);
        }
        e if error_to_status(e).is_server_error() => error!("File server error: {}", e),
        e => debug!("Request rejected: {}", e),
    }
}

impl IntoResponse for FileServerError {
    fn into_response(self) -> Response {
        handle_error(&self);
        let status = error_to_status(&self);

        match self {
            FileServerError::Auth(AuthError::Unauthenticated) => {
                (status, [(header::LOCATION, LOGIN_PATH)]).into_response()
            }
            FileServerError::Auth(e) => (status, Json(json!({ "error": e.to_string() }))).into_response(),
            e => (status, e.to_string()).into_response(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        FileServerError::from(self).into_response()
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        FileServerError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RangeError;

    #[test]
    fn maps_core_errors_to_client_statuses() {
        let escape = FileServerError::from(PathError::Escape("../x".into()));
        assert_eq!(error_to_status(&escape), StatusCode::BAD_REQUEST);

        let range = FileServerError::from(RangeError::MultipleRanges);
        assert_eq!(error_to_status(&range), StatusCode::RANGE_NOT_SATISFIABLE);

        let missing = FileServerError::from(StorageError::NotFound("a.txt".into()));
        assert_eq!(error_to_status(&missing), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
    }

    #[test]
    fn io_failures_are_server_errors() {
        let err = FileServerError::from(std::io::Error::other("disk full"));
        assert_eq!(error_to_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
