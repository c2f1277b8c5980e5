//! Container types: item descriptors, host descriptor, version.

use crate::codec::Digest;
use crate::config::{HASH_SIZE, MAX_NAME_LEN};
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Per-item feature bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ItemFlags(u8);

impl ItemFlags {
    /// Item bytes are stored LZ4-compressed.
    pub const COMPRESS: ItemFlags = ItemFlags(0x01);

    /// No flags set.
    pub const fn empty() -> Self {
        ItemFlags(0)
    }

    /// Wrap a raw flag byte. Unknown bits are kept.
    pub const fn from_bits(bits: u8) -> Self {
        ItemFlags(bits)
    }

    /// The raw flag byte.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: ItemFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ItemFlags {
    type Output = ItemFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ItemFlags(self.0 | rhs.0)
    }
}

/// Version of the writer that produced a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub revision: u8,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.revision)
    }
}

/// Describes one embedded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Feature bits for this item.
    pub flags: ItemFlags,
    /// Display name (source file name, no directories).
    pub name: String,
    /// Source path, only known while infecting.
    pub local_path: Option<PathBuf>,
    /// Bytes written into the carrier.
    pub stored_size: u32,
    /// Uncompressed size, 0 when stored raw.
    pub logical_size: u32,
    /// Absolute carrier position of the stored bytes.
    pub offset: u32,
    /// Digest of the original, uncompressed bytes.
    pub digest: Digest,
}

impl ItemDescriptor {
    /// Create a descriptor for a payload that has not been stored yet.
    pub fn new(name: impl Into<String>, flags: ItemFlags) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            flags,
            name,
            local_path: None,
            stored_size: 0,
            logical_size: 0,
            offset: 0,
            digest: [0u8; HASH_SIZE],
        })
    }

    /// Create a descriptor from a file on disk.
    ///
    /// The name is the file name with its directories stripped; the size
    /// recorded here is the source size and is replaced when the item is
    /// stored.
    pub fn from_file(path: &Path, flags: ItemFlags) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::InvalidName(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidName(path.display().to_string()))?;

        let size = metadata.len();
        let stored_size = u32::try_from(size).map_err(|_| Error::ItemTooLarge {
            name: name.to_string(),
            size,
        })?;

        let mut item = Self::new(name, flags)?;
        item.local_path = Some(path.to_path_buf());
        item.stored_size = stored_size;
        Ok(item)
    }

    /// Whether the stored bytes are compressed.
    pub fn is_compressed(&self) -> bool {
        self.flags.contains(ItemFlags::COMPRESS)
    }

    /// Size of the payload once extracted.
    pub fn original_size(&self) -> u32 {
        if self.is_compressed() {
            self.logical_size
        } else {
            self.stored_size
        }
    }

    /// First byte past the stored bytes.
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.stored_size as u64
    }
}

/// Describes the carrier as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostDescriptor {
    /// Version of the table last read or written.
    pub version: Version,
    /// Number of items in the table.
    pub item_count: u16,
    /// End of original host content; the restore boundary.
    pub base_offset: u32,
    /// Position of the live table.
    pub header_offset: u32,
    /// File length measured at open time.
    pub carrier_size: u64,
}

impl HostDescriptor {
    /// Zeroed descriptor for a freshly opened carrier.
    pub fn new(carrier_size: u64) -> Self {
        Self {
            carrier_size,
            ..Default::default()
        }
    }
}

/// Check that a name can be stored and later used as a file name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidName(name.to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::NameTooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}
