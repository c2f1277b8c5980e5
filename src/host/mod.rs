//! Container engine over a single carrier file.
//!
//! Composes the trailer, table and item transfer protocols into the
//! infect / extract / restore operations.

mod operations;

pub use operations::{Extraction, HostAccess, ParasiteHost};
