use std::ops::Range;

use serde::Serialize;

use crate::compression::Codec;
use crate::cursor::Cursor;
use crate::error::{BundleError, Result};

/// Signature tag opening every bundle we decode.
pub const SIGNATURE: &str = "UnityFS";

/// Blocks info is appended at the end of the file instead of following the
/// header.
pub const FLAG_BLOCKS_INFO_AT_END: u32 = 0x80;
/// Data section is re-aligned to 16 bytes (written by Unity 2019.4+).
pub const FLAG_PADDING_AT_START: u32 = 0x200;

/// Fixed-format preamble of a bundle file.
#[derive(Debug, Clone, Serialize)]
pub struct BundleHeader {
    pub signature: String,
    pub format_version: u32,
    pub player_version: String,
    pub engine_version: String,
    pub bundle_size: u64,
    pub compressed_blocks_info_size: u32,
    pub uncompressed_blocks_info_size: u32,
    pub flags: u32,
}

impl BundleHeader {
    /// Codec the blocks info section is compressed with.
    pub fn blocks_info_codec(&self) -> Result<Codec> {
        Codec::from_flags(self.flags)
    }

    pub fn blocks_info_at_end(&self) -> bool {
        self.flags & FLAG_BLOCKS_INFO_AT_END != 0
    }
}

/// Byte ranges of the two variable sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    /// Compressed blocks info bytes.
    pub blocks_info: Range<usize>,
    /// First byte of the concatenated storage blocks.
    pub data_start: usize,
}

/// Parse the preamble and work out where the compressed blocks info and the
/// data section live.
pub fn parse_header(cursor: &mut Cursor) -> Result<(BundleHeader, BundleLayout)> {
    let signature = cursor.read_cstring()?;
    if signature != SIGNATURE {
        return Err(BundleError::InvalidSignature { found: signature });
    }

    let format_version = cursor.read_u32()?;
    let player_version = cursor.read_cstring()?;
    let engine_version = cursor.read_cstring()?;
    let bundle_size = cursor.read_u64()?;
    let compressed_blocks_info_size = cursor.read_u32()?;
    let uncompressed_blocks_info_size = cursor.read_u32()?;
    let flags = cursor.read_u32()?;

    let header = BundleHeader {
        signature,
        format_version,
        player_version,
        engine_version,
        bundle_size,
        compressed_blocks_info_size,
        uncompressed_blocks_info_size,
        flags,
    };

    if header.compressed_blocks_info_size as u64 > header.bundle_size {
        return Err(BundleError::CorruptData {
            reason: format!(
                "blocks info ({} bytes) larger than the bundle itself ({} bytes)",
                header.compressed_blocks_info_size, header.bundle_size
            ),
        });
    }

    // Format 7 rounds the header up to a 16 byte boundary; format 6 bundles
    // start the next section immediately.
    if format_version >= 7 {
        cursor.align(16);
    }

    let info_size = compressed_blocks_info_size as usize;
    let (info_start, mut data_start) = if header.blocks_info_at_end() {
        let start =
            cursor
                .len()
                .checked_sub(info_size)
                .ok_or(BundleError::UnexpectedEndOfData {
                    offset: 0,
                    wanted: info_size,
                    available: cursor.len(),
                })?;
        (start, cursor.position())
    } else {
        let start = cursor.position();
        (start, start + info_size)
    };

    if flags & FLAG_PADDING_AT_START != 0 {
        data_start = data_start.next_multiple_of(16);
    }

    if info_start + info_size > cursor.len() {
        return Err(BundleError::UnexpectedEndOfData {
            offset: info_start,
            wanted: info_size,
            available: cursor.len().saturating_sub(info_start),
        });
    }

    Ok((
        header,
        BundleLayout {
            blocks_info: info_start..info_start + info_size,
            data_start,
        },
    ))
}
