//! Server middleware
//!
//! Request logging. Admission lives in [`crate::auth::gate`].

pub mod logging;

pub use logging::log_requests;
