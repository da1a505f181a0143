//! RAX File Server
//!
//! Serves one directory tree over HTTP(S) with optional login, resumable
//! downloads, and basic file management.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use config::{Cli, ServerConfig};
pub use error::FileServerError;
pub use server::Server;
