//! Configuration constants and types for parasite containers.

use crate::format::{ItemFlags, Version};
use serde::{Deserialize, Serialize};

/// Detection tag written as the very last bytes of an infected carrier.
pub const TAG: [u8; 8] = *b"Parasite";

/// Length of the detection tag.
pub const TAG_LEN: usize = TAG.len();

/// Trailer width: `header_offset` (u32) followed by the tag.
pub const TRAILER_LEN: u64 = 4 + TAG_LEN as u64;

/// Width of an item digest in bytes.
pub const HASH_SIZE: usize = 16;

/// Longest item name accepted on disk.
pub const MAX_NAME_LEN: usize = 255;

/// Table header: version (2), item count (2), base offset (4).
pub const TABLE_HEADER_LEN: u64 = 8;

/// Smallest possible item record (empty name).
pub const MIN_RECORD_LEN: u64 = 4 + 4 + 4 + 1 + HASH_SIZE as u64 + 2;

/// Most an LZ4 block can expand: each input byte yields at most 255 output
/// bytes. A compressed record claiming more is corrupt.
pub const MAX_EXPANSION_RATIO: u64 = 255;

/// Version stamped on every table this crate writes.
///
/// Revision 41 tables carry names without a NUL terminator.
pub const FORMAT_VERSION: Version = Version {
    major: 0,
    revision: 41,
};

/// Options for a parasite session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParasiteConfig {
    /// Store new items LZ4-compressed.
    pub compress: bool,

    /// Emit per-item diagnostics (digests, sizes, offsets).
    /// Never changes control flow.
    pub verbose: bool,
}

impl ParasiteConfig {
    /// Create a configuration with explicit settings.
    pub fn new(compress: bool, verbose: bool) -> Self {
        Self { compress, verbose }
    }

    /// Flags applied to items created under this configuration.
    pub fn item_flags(&self) -> ItemFlags {
        if self.compress {
            ItemFlags::COMPRESS
        } else {
            ItemFlags::empty()
        }
    }
}
