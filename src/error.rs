use thiserror::Error;

/// Decode failures for a UnityFS bundle. All of these are permanent: a
/// malformed bundle never parses differently on retry, so the first error
/// aborts the whole parse.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("invalid bundle signature {found:?}, expected \"UnityFS\"")]
    InvalidSignature { found: String },

    #[error("unexpected end of data at offset {offset}: wanted {wanted} bytes, {available} available")]
    UnexpectedEndOfData {
        offset: usize,
        wanted: usize,
        available: usize,
    },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidEncoding { offset: usize },

    #[error("unsupported compression codec tag {tag}")]
    UnsupportedCodec { tag: u32 },

    #[error("corrupt compressed data: {reason}")]
    CorruptData { reason: String },

    #[error("blocks info decompressed to {actual} bytes, header says {expected}")]
    DirectorySizeMismatch { expected: usize, actual: usize },

    #[error("blocks info truncated at offset {offset}")]
    TruncatedDirectory { offset: usize },

    #[error("node range {offset}..{end} exceeds the {capacity} byte uncompressed capacity")]
    NodeOutOfRange { offset: u64, end: u64, capacity: u64 },
}

pub type Result<T> = std::result::Result<T, BundleError>;
