//! Fixed-size tail that makes a carrier self-locating.
//!
//! Layout, as the last bytes of the file:
//!
//! ```text
//! [... table ...][header_offset: u32 LE][tag: b"Parasite"]
//! ```
//!
//! A reader seeks `TRAILER_LEN` bytes back from EOF; no scan is needed.

use super::wire::{read_bytes, read_u32, write_u32};
use crate::config::{TAG, TAG_LEN, TRAILER_LEN};
use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom, Write};

/// Check whether the stream ends with the parasite tag.
///
/// Streams shorter than a full trailer are reported as not infected.
pub fn detect<R: Read + Seek>(stream: &mut R) -> Result<bool> {
    let len = stream.seek(SeekFrom::End(0))?;
    if len < TRAILER_LEN {
        return Ok(false);
    }

    stream.seek(SeekFrom::End(-(TAG_LEN as i64)))?;
    let tag: [u8; TAG_LEN] = read_bytes(stream)?;
    Ok(tag == TAG)
}

/// Write the trailer at the current stream position.
pub fn write_trailer<W: Write>(stream: &mut W, header_offset: u32) -> Result<()> {
    write_u32(stream, header_offset)?;
    stream.write_all(&TAG)?;
    Ok(())
}

/// Read the table position back from the trailer.
pub fn read_trailer<R: Read + Seek>(stream: &mut R) -> Result<u32> {
    let len = stream.seek(SeekFrom::End(0))?;
    if len < TRAILER_LEN {
        return Err(Error::Truncated {
            needed: TRAILER_LEN,
            available: len,
        });
    }

    stream.seek(SeekFrom::Start(len - TRAILER_LEN))?;
    let header_offset = read_u32(stream)?;
    let tag: [u8; TAG_LEN] = read_bytes(stream)?;
    if tag != TAG {
        return Err(Error::MissingTrailer);
    }

    Ok(header_offset)
}
