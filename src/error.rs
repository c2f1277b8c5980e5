//! Error types for parasite containers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for parasite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing a parasite container.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ends before a fixed-size structure could be read.
    #[error("Truncated carrier: need {needed} bytes, have {available} bytes")]
    Truncated { needed: u64, available: u64 },

    /// The last bytes of the file are not the parasite tag.
    #[error("No parasite trailer found at end of carrier")]
    MissingTrailer,

    /// Item count in the table header cannot fit in the remaining stream.
    #[error("Implausible item count {count}: only {remaining} bytes remain for the table")]
    ImplausibleItemCount { count: u16, remaining: u64 },

    /// Item name is empty, contains a path separator, or is not UTF-8.
    #[error("Invalid item name: {0}")]
    InvalidName(String),

    /// Item name exceeds the on-disk limit.
    #[error("Item name too long ({len} bytes): {name}")]
    NameTooLong { name: String, len: usize },

    /// Base offset in the header lies beyond the carrier.
    #[error("Base offset {base_offset} seems corrupt (carrier is {carrier_size} bytes)")]
    CorruptBaseOffset { base_offset: u32, carrier_size: u64 },

    /// The trailer no longer points at the table loaded in this session.
    #[error("Stale table: trailer points at {found}, session loaded {expected}")]
    StaleTable { expected: u32, found: u32 },

    /// Other structural problem in the container.
    #[error("Malformed container: {0}")]
    Format(String),

    /// Named item is not present in the table.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// An item with the same name is already queued or stored.
    #[error("Duplicate item name: {0}")]
    DuplicateName(String),

    /// Carrier already carries a parasite table.
    #[error("{0} is already infected; add items to it instead")]
    AlreadyInfected(PathBuf),

    /// Carrier carries no parasite table.
    #[error("{0} is not infected")]
    NotInfected(PathBuf),

    /// Write operation on a carrier opened read-only.
    #[error("Carrier opened read-only: {0}")]
    ReadOnly(PathBuf),

    /// Operation called out of order (e.g. table read before header read).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Offsets past 4 GiB cannot be represented in the table.
    #[error("Carrier too large: position {position} exceeds 32-bit offsets")]
    CarrierTooLarge { position: u64 },

    /// Payload larger than a 32-bit size field.
    #[error("Item too large: {name} is {size} bytes")]
    ItemTooLarge { name: String, size: u64 },

    /// More items than the 16-bit count field can hold.
    #[error("Too many items: {0}")]
    TooManyItems(usize),

    /// Compression could not be performed for an item.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Stored compressed bytes could not be restored.
    #[error("Decompression failed: {0}")]
    Decompression(String),
}
