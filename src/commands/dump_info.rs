use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    bundle_fs::FS,
    directory::{Node, StorageBlock},
    header::BundleHeader,
};

#[derive(Serialize)]
struct Summary {
    block_count: usize,
    node_count: usize,
    total_compressed_size: u64,
    total_uncompressed_size: u64,
}

/// Snapshot of everything the decoder knows about a bundle
#[derive(Serialize)]
struct BundleInfo<'a> {
    header: &'a BundleHeader,
    blocks_info_hash: String,
    blocks: &'a [StorageBlock],
    nodes: &'a [Node],
    summary: Summary,
}

/// Dump the parsed header and tables as JSON to stdout
pub fn dump_info(fs: &FS) -> Result<()> {
    let bundle = fs.bundle();

    let info = BundleInfo {
        header: &bundle.header,
        blocks_info_hash: bundle
            .directory
            .hash
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect(),
        blocks: bundle.blocks(),
        nodes: bundle.nodes(),
        summary: Summary {
            block_count: bundle.blocks().len(),
            node_count: bundle.nodes().len(),
            total_compressed_size: bundle.directory.total_compressed_size(),
            total_uncompressed_size: bundle.total_uncompressed_size(),
        },
    };

    let mut stdout = BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut stdout, &info).context("Failed to serialize bundle info")?;
    writeln!(stdout).context("Failed to write to stdout")?;

    stdout.flush().context("Failed to flush stdout")
}
