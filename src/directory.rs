use serde::Serialize;

use crate::compression::{decompress, Codec};
use crate::cursor::Cursor;
use crate::error::{BundleError, Result};

/// One compressed chunk of the data section. Decompressed blocks
/// concatenate, in file order, into the logical address space that nodes
/// point into.
#[derive(Debug, Clone, Serialize)]
pub struct StorageBlock {
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub flags: u16,
}

impl StorageBlock {
    /// Per-block codec, encoded in the low 6 bits of the block flags.
    pub fn codec(&self) -> Result<Codec> {
        Codec::from_flags(self.flags as u32)
    }
}

/// A named entry addressing `[offset, offset + size)` of the logical
/// decompressed address space.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub offset: u64,
    pub size: u64,
    pub flags: u32,
    pub path: String,
}

impl Node {
    /// Set on entries holding a serialized object file rather than a plain
    /// resource blob.
    pub fn is_serialized_file(&self) -> bool {
        self.flags & 0x4 != 0
    }

    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// Decompressed blocks info: content hash plus the block and node tables.
#[derive(Debug, Clone, Serialize)]
pub struct Directory {
    pub hash: [u8; 16],
    pub blocks: Vec<StorageBlock>,
    pub nodes: Vec<Node>,
}

impl Directory {
    /// Logical size of the concatenation of all decompressed blocks.
    pub fn total_uncompressed_size(&self) -> u64 {
        self.blocks.iter().map(|b| b.uncompressed_size as u64).sum()
    }

    pub fn total_compressed_size(&self) -> u64 {
        self.blocks.iter().map(|b| b.compressed_size as u64).sum()
    }
}

/// Decompress the blocks info section and parse the tables out of it.
pub fn decode_directory(
    compressed: &[u8],
    codec: Codec,
    uncompressed_size: usize,
) -> Result<Directory> {
    let decompressed = decompress(codec, compressed, uncompressed_size)?;
    if decompressed.len() != uncompressed_size {
        return Err(BundleError::DirectorySizeMismatch {
            expected: uncompressed_size,
            actual: decompressed.len(),
        });
    }

    parse_directory(&decompressed)
}

// Record reads here run over the already-decompressed buffer, so a short
// read means the directory itself is truncated.
fn truncated(err: BundleError) -> BundleError {
    match err {
        BundleError::UnexpectedEndOfData { offset, .. } => {
            BundleError::TruncatedDirectory { offset }
        }
        e => e,
    }
}

fn parse_directory(input: &[u8]) -> Result<Directory> {
    let mut cursor = Cursor::new(input);

    let hash: [u8; 16] = cursor
        .read_bytes(16)
        .map_err(truncated)?
        .try_into()
        .unwrap();

    let block_count = cursor.read_u32().map_err(truncated)? as usize;
    // A corrupt count cannot ask for more records than the buffer could hold
    let mut blocks = Vec::with_capacity(block_count.min(input.len() / 10));
    for _ in 0..block_count {
        let uncompressed_size = cursor.read_u32().map_err(truncated)?;
        let compressed_size = cursor.read_u32().map_err(truncated)?;
        let flags = cursor.read_u16().map_err(truncated)?;
        blocks.push(StorageBlock {
            uncompressed_size,
            compressed_size,
            flags,
        });
    }

    let node_count = cursor.read_u32().map_err(truncated)? as usize;
    let mut nodes = Vec::with_capacity(node_count.min(input.len() / 21));
    for _ in 0..node_count {
        let offset = cursor.read_u64().map_err(truncated)?;
        let size = cursor.read_u64().map_err(truncated)?;
        let flags = cursor.read_u32().map_err(truncated)?;
        // Paths are taken verbatim; consumers key on the exact string
        let path = cursor.read_cstring().map_err(truncated)?;
        nodes.push(Node {
            offset,
            size,
            flags,
            path,
        });
    }

    warn_on_overlap(&nodes);

    Ok(Directory {
        hash,
        blocks,
        nodes,
    })
}

// Nodes normally tile the address space; report aliased ranges rather than
// silently accepting them.
fn warn_on_overlap(nodes: &[Node]) {
    let mut spans: Vec<_> = nodes.iter().filter(|n| n.size > 0).collect();
    spans.sort_by_key(|n| n.offset);

    // Sweep with the furthest end seen so far, so a long node is checked
    // against every later node it covers, not just its neighbour
    let mut covered: Option<&Node> = None;
    for node in spans {
        if let Some(prev) = covered {
            if node.offset < prev.end() {
                eprintln!("Warning: node {:?} overlaps {:?}", node.path, prev.path);
            }
        }
        if covered.map_or(true, |prev| node.end() > prev.end()) {
            covered = Some(node);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Uncompressed blocks info with the given tables.
    pub(crate) fn directory_bytes(
        blocks: &[(u32, u32, u16)],
        nodes: &[(u64, u64, u32, &str)],
    ) -> Vec<u8> {
        let mut out = vec![0xab; 16];

        out.extend_from_slice(&(blocks.len() as u32).to_be_bytes());
        for &(uncompressed, compressed, flags) in blocks {
            out.extend_from_slice(&uncompressed.to_be_bytes());
            out.extend_from_slice(&compressed.to_be_bytes());
            out.extend_from_slice(&flags.to_be_bytes());
        }

        out.extend_from_slice(&(nodes.len() as u32).to_be_bytes());
        for &(offset, size, flags, path) in nodes {
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&size.to_be_bytes());
            out.extend_from_slice(&flags.to_be_bytes());
            out.extend_from_slice(path.as_bytes());
            out.push(0);
        }

        out
    }

    #[test]
    fn test_parse_tables() {
        let raw = directory_bytes(
            &[(100, 60, 2), (50, 50, 0)],
            &[
                (0, 100, 4, "CAB-1234/CAB-1234"),
                (100, 50, 0, "CAB-1234/CAB-1234.resS"),
            ],
        );

        let directory = decode_directory(&raw, Codec::None, raw.len()).unwrap();

        assert_eq!(directory.hash, [0xab; 16]);
        assert_eq!(directory.blocks.len(), 2);
        assert_eq!(directory.blocks[0].codec().unwrap(), Codec::Lz4);
        assert_eq!(directory.blocks[1].codec().unwrap(), Codec::None);
        assert_eq!(directory.total_uncompressed_size(), 150);
        assert_eq!(directory.total_compressed_size(), 110);

        assert_eq!(directory.nodes.len(), 2);
        assert_eq!(directory.nodes[0].path, "CAB-1234/CAB-1234");
        assert!(directory.nodes[0].is_serialized_file());
        assert!(!directory.nodes[1].is_serialized_file());
        assert_eq!(directory.nodes[1].offset, 100);
        assert_eq!(directory.nodes[1].size, 50);
    }

    #[test]
    fn test_truncated_block_table() {
        let raw = directory_bytes(&[(100, 60, 2)], &[]);

        // Chop the record table mid-block
        let truncated = &raw[..24];
        assert!(matches!(
            decode_directory(truncated, Codec::None, truncated.len()),
            Err(BundleError::TruncatedDirectory { .. })
        ));
    }

    #[test]
    fn test_truncated_node_path() {
        let raw = directory_bytes(&[(10, 10, 0)], &[(0, 10, 4, "some/path")]);

        // Drop the path's null terminator
        let truncated = &raw[..raw.len() - 1];
        assert!(matches!(
            decode_directory(truncated, Codec::None, truncated.len()),
            Err(BundleError::TruncatedDirectory { .. })
        ));
    }

    #[test]
    fn test_lz4_compressed_directory() {
        let raw = directory_bytes(&[(10, 10, 0)], &[(0, 10, 4, "a")]);
        let compressed = lz4_flex::block::compress(&raw);

        let directory = decode_directory(&compressed, Codec::Lz4, raw.len()).unwrap();
        assert_eq!(directory.nodes[0].path, "a");

        // One byte short of compressed input must fail loudly
        assert!(matches!(
            decode_directory(&compressed[..compressed.len() - 1], Codec::Lz4, raw.len()),
            Err(BundleError::CorruptData { .. })
        ));
    }

    #[test]
    fn test_identity_codec_size_mismatch() {
        let raw = directory_bytes(&[], &[]);
        assert!(matches!(
            decode_directory(&raw, Codec::None, raw.len() + 1),
            Err(BundleError::CorruptData { .. })
        ));
    }

    #[test]
    fn test_non_utf8_path() {
        let mut raw = directory_bytes(&[(10, 10, 0)], &[(0, 10, 4, "abc")]);
        let nul = raw.len() - 1;
        raw[nul - 1] = 0xff;

        assert!(matches!(
            decode_directory(&raw, Codec::None, raw.len()),
            Err(BundleError::InvalidEncoding { .. })
        ));
    }
}
