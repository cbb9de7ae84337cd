use std::{fs, path::Path};

use anyhow::Context;
use bytes::Bytes;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

use crate::compression::decompress;
use crate::cursor::Cursor;
use crate::directory::{decode_directory, Directory, Node, StorageBlock};
use crate::error::{BundleError, Result};
use crate::header::{parse_header, BundleHeader};

// Cumulative offsets for one storage block: where its decompressed bytes sit
// in the logical address space, and where its compressed bytes sit in the
// file.
#[derive(Debug, Clone, Copy)]
struct BlockSlot {
    logical_start: u64,
    file_start: usize,
}

/// A parsed bundle: header and tables plus the raw file buffer. Storage
/// blocks stay compressed until a read touches them, so loading a large
/// bundle and pulling out one node only decompresses the blocks that node
/// spans.
#[derive(Debug)]
pub struct Bundle {
    pub header: BundleHeader,
    pub directory: Directory,
    data: Bytes,
    slots: Vec<BlockSlot>,
    total_uncompressed: u64,
}

impl Bundle {
    /// Parse the header and blocks info out of a whole bundle file.
    pub fn parse(data: Bytes) -> Result<Bundle> {
        let mut cursor = Cursor::new(&data);
        let (header, layout) = parse_header(&mut cursor)?;

        let directory = decode_directory(
            &data[layout.blocks_info.clone()],
            header.blocks_info_codec()?,
            header.uncompressed_blocks_info_size as usize,
        )?;

        // The data section runs to the end of the file, or up to the blocks
        // info when that is the part stored at the tail.
        let data_end = if header.blocks_info_at_end() {
            layout.blocks_info.start
        } else {
            data.len()
        };
        let total_compressed = directory.total_compressed_size();
        if layout.data_start as u64 + total_compressed > data_end as u64 {
            return Err(BundleError::UnexpectedEndOfData {
                offset: layout.data_start,
                wanted: total_compressed as usize,
                available: data_end.saturating_sub(layout.data_start),
            });
        }

        // Prefix sums over the block table, so a logical offset resolves to
        // a block without rescanning the list on every read.
        let mut slots = Vec::with_capacity(directory.blocks.len());
        let mut logical = 0u64;
        let mut file = layout.data_start;
        for block in &directory.blocks {
            slots.push(BlockSlot {
                logical_start: logical,
                file_start: file,
            });
            logical += block.uncompressed_size as u64;
            file += block.compressed_size as usize;
        }

        Ok(Bundle {
            header,
            directory,
            data,
            slots,
            total_uncompressed: logical,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.directory.nodes
    }

    pub fn blocks(&self) -> &[StorageBlock] {
        &self.directory.blocks
    }

    /// Exact-path lookup in the node table. No normalization: paths match
    /// byte for byte, forward slashes and all.
    pub fn node(&self, path: &str) -> Option<&Node> {
        self.directory.nodes.iter().find(|n| n.path == path)
    }

    /// Logical size of the concatenation of all decompressed blocks.
    pub fn total_uncompressed_size(&self) -> u64 {
        self.total_uncompressed
    }

    /// Return exactly `node.size` bytes for the node's logical range.
    pub fn extract(&self, node: &Node) -> Result<Bytes> {
        self.read_range(node.offset, node.size)
    }

    /// Read `len` bytes at `offset` of the logical decompressed address
    /// space, decompressing only the storage blocks the range spans.
    pub fn read_range(&self, offset: u64, len: u64) -> Result<Bytes> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.total_uncompressed)
            .ok_or(BundleError::NodeOutOfRange {
                offset,
                end: offset.saturating_add(len),
                capacity: self.total_uncompressed,
            })?;
        if len == 0 {
            return Ok(Bytes::new());
        }

        // First and last blocks the range touches. Slots are ordered by
        // logical_start, so the containing block is the last slot starting
        // at or before the position.
        let first = self.slots.partition_point(|s| s.logical_start <= offset) - 1;
        let last = self.slots.partition_point(|s| s.logical_start < end) - 1;

        let span_start = self.slots[first].logical_start;
        let span_end =
            self.slots[last].logical_start + self.directory.blocks[last].uncompressed_size as u64;
        let mut buf = vec![0u8; (span_end - span_start) as usize];

        // Carve the scratch buffer into one disjoint chunk per block so the
        // spanned blocks can decompress in parallel.
        let mut chunks = Vec::with_capacity(last - first + 1);
        let mut rest = buf.as_mut_slice();
        for block in &self.directory.blocks[first..=last] {
            let (chunk, tail) = rest.split_at_mut(block.uncompressed_size as usize);
            chunks.push(chunk);
            rest = tail;
        }

        chunks
            .into_par_iter()
            .zip(&self.directory.blocks[first..=last])
            .zip(&self.slots[first..=last])
            .try_for_each(|((chunk, block), slot)| {
                let compressed = self.compressed_bytes(block, slot)?;
                let decompressed = decompress(block.codec()?, compressed, chunk.len())?;
                chunk.copy_from_slice(&decompressed);
                Ok(())
            })?;

        // Grab the requested subset of the block-aligned buffer
        let local = (offset - span_start) as usize;
        Ok(Bytes::from(buf).slice(local..local + len as usize))
    }

    // Compressed byte range of one block within the file buffer.
    fn compressed_bytes(&self, block: &StorageBlock, slot: &BlockSlot) -> Result<&[u8]> {
        let start = slot.file_start;
        self.data
            .get(start..start + block.compressed_size as usize)
            .ok_or(BundleError::UnexpectedEndOfData {
                offset: start,
                wanted: block.compressed_size as usize,
                available: self.data.len().saturating_sub(start),
            })
    }
}

/// Load and parse a bundle file from disk.
pub fn load_bundle(path: &Path) -> anyhow::Result<Bundle> {
    let content = fs::read(path).context("Failed to read bundle file")?;
    Ok(Bundle::parse(content.into())?)
}
