//! Low-level carrier file operations.

use crate::error::Result;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Current length of the stream. Leaves the cursor at EOF.
pub fn stream_len<S: Seek>(stream: &mut S) -> Result<u64> {
    Ok(stream.seek(SeekFrom::End(0))?)
}

/// Copy the first `len` bytes of `stream` into a new file at `dest`.
///
/// Returns the number of bytes written. A source shorter than `len` is an
/// `UnexpectedEof` I/O error and the partial file is left in place.
pub fn copy_prefix<R: Read + Seek>(stream: &mut R, len: u64, dest: &Path) -> Result<u64> {
    stream.seek(SeekFrom::Start(0))?;

    let mut out = File::create(dest)?;
    let copied = io::copy(&mut stream.by_ref().take(len), &mut out)?;
    if copied != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("carrier ended after {} of {} bytes", copied, len),
        )
        .into());
    }

    out.flush()?;
    out.sync_all()?;
    Ok(copied)
}

/// Drop everything after `len`, so the trailer is the last thing in the file.
pub fn truncate(file: &File, len: u64) -> Result<()> {
    file.set_len(len)?;
    Ok(())
}
