use std::io::Read;

use serde::Serialize;
use xz2::read::XzDecoder;
use xz2::stream::{Filters, LzmaOptions, Stream};

use crate::error::{BundleError, Result};

/// Mask selecting the codec tag from an archive or block flags word.
pub const CODEC_MASK: u32 = 0x3F;

/// Encoded in the low 6 bits of the archive/block flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Codec {
    None,  // 0
    Lzma,  // 1
    Lz4,   // 2
    Lz4hc, // 3
}

impl Codec {
    fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Lzma),
            2 => Some(Self::Lz4),
            3 => Some(Self::Lz4hc),
            _ => None,
        }
    }

    /// Pick the codec out of an archive or block flags word.
    pub fn from_flags(flags: u32) -> Result<Self> {
        let tag = flags & CODEC_MASK;
        Self::from_u32(tag).ok_or(BundleError::UnsupportedCodec { tag })
    }
}

/// Decompress `input` into exactly `uncompressed_size` bytes.
///
/// Anything else - a malformed stream, an under- or overshoot of the target
/// length - is `CorruptData`.
pub fn decompress(codec: Codec, input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    match codec {
        Codec::None => {
            if input.len() != uncompressed_size {
                return Err(BundleError::CorruptData {
                    reason: format!(
                        "stored block is {} bytes, expected {}",
                        input.len(),
                        uncompressed_size
                    ),
                });
            }
            Ok(input.to_vec())
        }
        // LZ4 and LZ4HC only differ on the compressor side; the block
        // stream decodes the same way.
        Codec::Lz4 | Codec::Lz4hc => {
            let output = lz4_flex::block::decompress(input, uncompressed_size)
                .map_err(|e| BundleError::CorruptData {
                    reason: format!("lz4: {e}"),
                })?;
            if output.len() != uncompressed_size {
                return Err(BundleError::CorruptData {
                    reason: format!(
                        "lz4 produced {} bytes, expected {}",
                        output.len(),
                        uncompressed_size
                    ),
                });
            }
            Ok(output)
        }
        Codec::Lzma => decompress_lzma(input, uncompressed_size),
    }
}

/// Raw LZMA1 as stored in the container: a 5-byte property prefix (packed
/// lc/lp/pb byte, then little-endian dictionary size), followed by the
/// compressed payload with no length field.
fn decompress_lzma(input: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    if input.len() < 5 {
        return Err(BundleError::CorruptData {
            reason: format!("lzma property prefix truncated: {} bytes", input.len()),
        });
    }

    let props = input[0];
    if props >= 9 * 5 * 5 {
        return Err(BundleError::CorruptData {
            reason: format!("invalid lzma properties byte 0x{props:02x}"),
        });
    }
    let lc = (props % 9) as u32;
    let lp = ((props / 9) % 5) as u32;
    let pb = (props / 45) as u32;
    let dict_size = u32::from_le_bytes(input[1..5].try_into().unwrap());

    let mut options = LzmaOptions::new_preset(6).map_err(|e| BundleError::CorruptData {
        reason: format!("lzma options: {e}"),
    })?;
    options
        .literal_context_bits(lc)
        .literal_position_bits(lp)
        .position_bits(pb)
        .dict_size(dict_size);

    let mut filters = Filters::new();
    filters.lzma1(&options);
    let stream = Stream::new_raw_decoder(&filters).map_err(|e| BundleError::CorruptData {
        reason: format!("lzma decoder init: {e}"),
    })?;

    let mut output = vec![0; uncompressed_size];
    let mut decoder = XzDecoder::new_stream(&input[5..], stream);
    decoder
        .read_exact(&mut output)
        .map_err(|e| BundleError::CorruptData {
            reason: format!("lzma: {e}"),
        })?;
    Ok(output)
}
