//! Transfer module
//!
//! Byte-range parsing and the download responder built on it.

pub mod download;
pub mod range;

pub use download::respond;
pub use range::{ByteRange, parse_range, parse_single_range};
