//! Byte-level adapters used by the item transfer protocol.
//!
//! This module provides:
//! - LZ4 block compression with a worst-case scratch bound
//! - A 16-byte content digest and its verification result

pub mod hash;
pub mod lz;

pub use hash::{digest16, verify, Digest, Verification};
pub use lz::{compress, decompress, scratch_bound};
