//! Little-endian field helpers shared by the trailer and table codecs.

use crate::error::{Error, Result};
use std::io::{ErrorKind, Read, Write};

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::Format(format!("short read of {}-byte field", N)),
        _ => Error::Io(e),
    })?;
    Ok(buf)
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    Ok(read_array::<R, 1>(reader)?[0])
}

pub(crate) fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    Ok(u16::from_le_bytes(read_array(reader)?))
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    Ok(u32::from_le_bytes(read_array(reader)?))
}

pub(crate) fn read_bytes<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    read_array(reader)
}

pub(crate) fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Narrow a stream position to the 32-bit offsets used on disk.
pub(crate) fn to_offset(position: u64) -> Result<u32> {
    u32::try_from(position).map_err(|_| Error::CarrierTooLarge { position })
}
