//! Server core functionality
//!
//! Router assembly, shared state, TLS setup, and the listener itself.

pub mod core;
pub mod routes;
pub mod state;
pub mod tls;

pub use core::Server;
pub use routes::build_router;
pub use state::AppState;
