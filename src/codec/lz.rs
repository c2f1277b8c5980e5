//! LZ4 block compression for stored items.

use crate::error::{Error, Result};

/// Worst-case output size reserved before compressing `len` bytes.
///
/// Never smaller than what the LZ4 block encoder itself requires.
pub fn scratch_bound(len: usize) -> usize {
    let legacy = len.saturating_mul(104).saturating_add(50) / 100 + 384;
    legacy.max(lz4_flex::block::get_maximum_output_size(len))
}

/// Compress `src` into a freshly sized buffer.
///
/// The scratch buffer is reserved fallibly: running out of memory is a
/// `Compression` error for this item, not an abort.
pub fn compress(src: &[u8]) -> Result<Vec<u8>> {
    let bound = scratch_bound(src.len());

    let mut scratch: Vec<u8> = Vec::new();
    scratch.try_reserve_exact(bound).map_err(|e| {
        Error::Compression(format!("cannot reserve {} scratch bytes: {}", bound, e))
    })?;
    scratch.resize(bound, 0);

    let written = lz4_flex::block::compress_into(src, &mut scratch)
        .map_err(|e| Error::Compression(e.to_string()))?;
    scratch.truncate(written);

    Ok(scratch)
}

/// Decompress `src`, which must expand to exactly `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::new();
    out.try_reserve_exact(expected_len).map_err(|e| {
        Error::Decompression(format!("cannot reserve {} bytes: {}", expected_len, e))
    })?;
    out.resize(expected_len, 0);

    let written = lz4_flex::block::decompress_into(src, &mut out)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    if written != expected_len {
        return Err(Error::Decompression(format!(
            "expected {} bytes, got {}",
            expected_len, written
        )));
    }

    Ok(out)
}
