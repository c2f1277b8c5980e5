//! Table codec: host fields plus the ordered item list.
//!
//! Layout at `header_offset`:
//!
//! ```text
//! [major:u8][revision:u8][item_count:u16][base_offset:u32]
//! item_count x [stored_size:u32][logical_size:u32][offset:u32]
//!              [flags:u8][digest:16][name_len:u16][name]
//! [trailer]
//! ```

use super::trailer::write_trailer;
use super::types::{validate_name, HostDescriptor, ItemDescriptor, ItemFlags, Version};
use super::wire::{read_bytes, read_u16, read_u32, read_u8, to_offset, write_u16, write_u32};
use crate::config::{
    FORMAT_VERSION, HASH_SIZE, MAX_EXPANSION_RATIO, MAX_NAME_LEN, MIN_RECORD_LEN,
    TABLE_HEADER_LEN, TRAILER_LEN,
};
use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

/// Fixed fields at the start of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    pub version: Version,
    pub item_count: u16,
    pub base_offset: u32,
    /// Position the header was read from.
    pub header_offset: u32,
}

/// Serialize the table and trailer.
///
/// Writes at `at`, or at the current position when `at` is `None`.
/// Updates `host.header_offset`, `host.item_count` and `host.version`,
/// and returns the position just past the trailer.
pub fn write_table<W: Write + Seek>(
    stream: &mut W,
    host: &mut HostDescriptor,
    items: &[ItemDescriptor],
    at: Option<u64>,
) -> Result<u64> {
    if let Some(at) = at {
        stream.seek(SeekFrom::Start(at))?;
    }
    let position = stream.stream_position()?;
    let header_offset = to_offset(position)?;
    let item_count = u16::try_from(items.len()).map_err(|_| Error::TooManyItems(items.len()))?;

    let mut buf = Vec::with_capacity(TABLE_HEADER_LEN as usize + items.len() * 64);
    buf.push(FORMAT_VERSION.major);
    buf.push(FORMAT_VERSION.revision);
    write_u16(&mut buf, item_count)?;
    write_u32(&mut buf, host.base_offset)?;

    for item in items {
        validate_name(&item.name)?;

        write_u32(&mut buf, item.stored_size)?;
        write_u32(&mut buf, item.logical_size)?;
        write_u32(&mut buf, item.offset)?;
        buf.push(item.flags.bits());
        buf.extend_from_slice(&item.digest);
        write_u16(&mut buf, item.name.len() as u16)?;
        buf.extend_from_slice(item.name.as_bytes());
    }

    write_trailer(&mut buf, header_offset)?;
    stream.write_all(&buf)?;

    host.version = FORMAT_VERSION;
    host.item_count = item_count;
    host.header_offset = header_offset;

    debug!(
        header_offset,
        item_count,
        table_len = buf.len(),
        "Wrote file table"
    );

    Ok(position + buf.len() as u64)
}

/// Read the fixed table header at `at`.
pub fn read_table_header<R: Read + Seek>(
    stream: &mut R,
    at: u32,
    stream_len: u64,
) -> Result<TableHeader> {
    let needed = at as u64 + TABLE_HEADER_LEN + TRAILER_LEN;
    if needed > stream_len {
        return Err(Error::Truncated {
            needed,
            available: stream_len,
        });
    }

    stream.seek(SeekFrom::Start(at as u64))?;
    let major = read_u8(stream)?;
    let revision = read_u8(stream)?;
    let item_count = read_u16(stream)?;
    let base_offset = read_u32(stream)?;

    Ok(TableHeader {
        version: Version { major, revision },
        item_count,
        base_offset,
        header_offset: at,
    })
}

/// Read `count` item records starting at the current position.
///
/// `limit` is the first byte that may not belong to the table (the start
/// of the trailer). A compressed record whose `logical_size` is beyond
/// what LZ4 can expand `stored_size` to is rejected before anything is
/// allocated for it.
pub fn read_items<R: Read + Seek>(
    stream: &mut R,
    count: u16,
    limit: u64,
) -> Result<Vec<ItemDescriptor>> {
    let start = stream.stream_position()?;
    let remaining = limit.saturating_sub(start);
    if count as u64 * MIN_RECORD_LEN > remaining {
        return Err(Error::ImplausibleItemCount { count, remaining });
    }

    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let stored_size = read_u32(stream)?;
        let logical_size = read_u32(stream)?;
        let offset = read_u32(stream)?;
        let flags = ItemFlags::from_bits(read_u8(stream)?);
        let digest: [u8; HASH_SIZE] = read_bytes(stream)?;
        let name = read_name(stream, limit)?;

        if flags.contains(ItemFlags::COMPRESS)
            && logical_size as u64 > stored_size as u64 * MAX_EXPANSION_RATIO
        {
            return Err(Error::Format(format!(
                "item {} claims {} bytes from {} compressed bytes",
                name, logical_size, stored_size
            )));
        }

        items.push(ItemDescriptor {
            flags,
            name,
            local_path: None,
            stored_size,
            logical_size,
            offset,
            digest,
        });
    }

    Ok(items)
}

/// Read header and items at `at`.
pub fn read_table<R: Read + Seek>(
    stream: &mut R,
    at: u32,
    stream_len: u64,
) -> Result<(TableHeader, Vec<ItemDescriptor>)> {
    let header = read_table_header(stream, at, stream_len)?;
    let items = read_items(stream, header.item_count, stream_len - TRAILER_LEN)?;
    Ok((header, items))
}

fn read_name<R: Read + Seek>(stream: &mut R, limit: u64) -> Result<String> {
    let len = read_u16(stream)? as usize;
    // Older writers counted a NUL terminator.
    if len > MAX_NAME_LEN + 1 {
        return Err(Error::Format(format!("name length {} out of range", len)));
    }

    let position = stream.stream_position()?;
    if position + len as u64 > limit {
        return Err(Error::Truncated {
            needed: position + len as u64,
            available: limit,
        });
    }

    let mut raw = vec![0u8; len];
    stream.read_exact(&mut raw)?;
    if raw.last() == Some(&0) {
        raw.pop();
    }

    let name = String::from_utf8(raw)
        .map_err(|e| Error::InvalidName(String::from_utf8_lossy(e.as_bytes()).into_owned()))?;
    validate_name(&name)?;
    Ok(name)
}
