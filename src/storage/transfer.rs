//! Moving one payload between its source bytes and the carrier stream.

use crate::codec::{compress, decompress, digest16};
use crate::error::{Error, Result};
use crate::format::ItemDescriptor;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

/// Store `source` for `item` at stream position `at`.
///
/// The digest is always taken over the uncompressed source. When the item
/// asks for compression and it cannot be done, the item fails; nothing is
/// written and it is never silently stored raw.
///
/// On success `offset`, `stored_size`, `logical_size` and `digest` are set.
pub fn store_item<W: Write + Seek>(
    stream: &mut W,
    item: &mut ItemDescriptor,
    source: &[u8],
    at: u64,
) -> Result<()> {
    let source_len = u32::try_from(source.len()).map_err(|_| Error::ItemTooLarge {
        name: item.name.clone(),
        size: source.len() as u64,
    })?;
    let offset = u32::try_from(at).map_err(|_| Error::CarrierTooLarge { position: at })?;

    let digest = digest16(source);

    let compressed;
    let payload: &[u8] = if item.is_compressed() {
        compressed = compress(source)?;
        &compressed
    } else {
        source
    };
    let stored_size = payload.len() as u32;

    stream.seek(SeekFrom::Start(at))?;
    stream.write_all(payload)?;

    item.digest = digest;
    item.offset = offset;
    item.stored_size = stored_size;
    item.logical_size = if item.is_compressed() { source_len } else { 0 };

    debug!(
        name = %item.name,
        offset,
        stored_size,
        logical_size = item.logical_size,
        "Stored item"
    );

    Ok(())
}

/// Read an item's bytes back, decompressed if needed.
///
/// `stream_len` bounds the read so a corrupt descriptor cannot run past EOF.
pub fn load_item<R: Read + Seek>(
    stream: &mut R,
    item: &ItemDescriptor,
    stream_len: u64,
) -> Result<Vec<u8>> {
    if item.end() > stream_len {
        return Err(Error::Truncated {
            needed: item.end(),
            available: stream_len,
        });
    }

    stream.seek(SeekFrom::Start(item.offset as u64))?;
    let mut stored = vec![0u8; item.stored_size as usize];
    stream.read_exact(&mut stored)?;

    if item.is_compressed() {
        decompress(&stored, item.logical_size as usize)
    } else {
        Ok(stored)
    }
}
