use std::{
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

use crate::{bundle_fs::FS, VERBOSE};

/// Extract nodes matching a glob pattern to a folder, keeping the node
/// paths as relative paths under it. A node that fails to extract is
/// reported and skipped rather than aborting the rest.
pub fn extract_nodes(fs: &FS, patterns: &[Pattern], output_folder: &Path) -> Result<()> {
    let verbose = VERBOSE.get().copied().unwrap_or(false);

    fs.read_all()
        .filter(|(node, _)| {
            patterns.iter().any(|pattern| {
                pattern.matches_with(
                    &node.path,
                    MatchOptions {
                        require_literal_separator: true,
                        ..Default::default()
                    },
                )
            })
        })
        // Print and filter out extraction errors
        .filter_map(|(node, contents)| match contents {
            Ok(x) => Some((node, x)),
            Err(e) => {
                eprintln!("Failed to extract node: {}: {:?}", node.path, e);
                None
            }
        })
        // Attempt to write node contents to disk
        .map(|(node, contents)| -> Result<_> {
            let out_filename = output_folder.join(&node.path);
            if let Some(parent) = out_filename.parent() {
                fs::create_dir_all(parent).context("Failed to create folder")?;
            }

            fs::write(out_filename, &contents).context("Failed to write file")?;

            Ok(&node.path)
        })
        // Report results
        .for_each(|result| match result {
            Ok(path) => {
                if verbose {
                    eprintln!("Extracted node: {}", path);
                }
            }
            Err(e) => eprintln!("Failed to extract node: {:?}", e),
        });

    Ok(())
}
