//! Error types
//!
//! Defines domain-specific error types for each module of the file server.

use std::io;

use thiserror::Error;

/// Path confinement errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path would leave the served root, or cannot be resolved at all.
    #[error("Path escapes the served directory: {0}")]
    Escape(String),
}

/// Byte-range errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Malformed Range header")]
    Malformed,
    #[error("Requested range not satisfiable")]
    Unsatisfiable,
    #[error("Multiple ranges are not supported")]
    MultipleRanges,
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Malformed login request: {0}")]
    MalformedRequest(String),
    #[error("Authentication is disabled on this server")]
    Disabled,
}

/// Certificate bootstrap errors
#[derive(Debug, Error)]
pub enum CertError {
    #[error("Failed to generate self-signed certificate: {0}")]
    GenerationFailed(String),
    #[error("Failed to load TLS material: {0}")]
    LoadFailed(#[source] io::Error),
}

/// Storage module errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Is a directory: {0}")]
    IsDirectory(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error("The served root directory cannot be modified")]
    RootProtected,
    #[error(transparent)]
    InvalidPath(#[from] PathError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// General file server error that encompasses all error types
#[derive(Debug, Error)]
pub enum FileServerError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    #[error("Range error: {0}")]
    Range(#[from] RangeError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Certificate error: {0}")]
    Cert(#[from] CertError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
