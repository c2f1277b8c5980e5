//! Storage layer for carrier operations.
//!
//! This module handles:
//! - Writing and reading item bytes at absolute carrier positions
//! - Tracking the next free write position
//! - Copying and truncating the carrier file

mod carrier;
mod region;
pub mod transfer;

pub use carrier::{copy_prefix, stream_len, truncate};
pub use region::Region;
pub use transfer::{load_item, store_item};
