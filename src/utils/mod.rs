//! Utility functions
//!
//! Provides formatting helpers shared by the handlers.

pub mod format;

pub use format::format_size;
