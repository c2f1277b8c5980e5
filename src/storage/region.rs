//! Write-position tracking for the appended payload region.

use crate::error::{Error, Result};

/// Single "next free write position" cursor over the carrier.
///
/// A fresh infection starts at the end of the host. Adding to an existing
/// container starts at the old table position, so the old table region is
/// reclaimed as soon as the first new item is written there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    next: u64,
}

impl Region {
    /// Region starting at the end of an uninfected carrier.
    pub fn fresh(carrier_size: u64) -> Self {
        Self { next: carrier_size }
    }

    /// Region that reuses the space of the table at `header_offset`.
    pub fn reclaim(header_offset: u32) -> Self {
        Self {
            next: header_offset as u64,
        }
    }

    /// Current write position.
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Reserve `len` bytes and return their start.
    ///
    /// Fails if the start or the end would not fit a 32-bit offset.
    pub fn allocate(&mut self, len: u64) -> Result<u64> {
        let start = self.next;
        let end = start + len;
        if end > u32::MAX as u64 {
            return Err(Error::CarrierTooLarge { position: end });
        }
        self.next = end;
        Ok(start)
    }
}
