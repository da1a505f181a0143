//! HTTP request handlers
//!
//! Session endpoints (login page, login API, logout) and the file
//! management endpoints behind the auth gate.

pub mod files;
pub mod session;

pub use files::{create, delete, download, list, rename, upload};
pub use session::{api_login, login_page, logout};
