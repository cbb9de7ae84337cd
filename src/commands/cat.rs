use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};

use crate::bundle_fs::FS;

/// Write the contents of a single node to stdout
pub fn cat_node(fs: &FS, path: &str) -> Result<()> {
    let contents = fs.read(path).context("Failed to read node")?;

    let mut stdout = BufWriter::new(io::stdout().lock());
    stdout
        .write_all(&contents)
        .context("Failed to write to stdout")?;

    stdout.flush().context("Failed to flush stdout")
}
