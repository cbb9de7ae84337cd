use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use bytes::Bytes;

use crate::bundle::{load_bundle, Bundle};
use crate::directory::Node;

/// Path-keyed view over a single bundle's node table.
pub struct FS {
    bundle: Bundle,
    lut: HashMap<String, usize>,
}

/// Initialise a file system over a bundle file on disk
pub fn from_file(path: &Path) -> Result<FS> {
    let bundle = load_bundle(path).context("Failed to load bundle")?;
    Ok(FS::new(bundle))
}

impl FS {
    pub fn new(bundle: Bundle) -> FS {
        let lut = bundle
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.path.clone(), i))
            .collect();

        FS { bundle, lut }
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// Lists all node paths in the bundle
    pub fn list(&self) -> impl Iterator<Item = &str> + '_ {
        self.bundle.nodes().iter().map(|n| n.path.as_str())
    }

    /// Read a single node's contents by its exact path
    pub fn read(&self, path: &str) -> Result<Bytes> {
        let index = self
            .lut
            .get(path)
            .with_context(|| format!("Path not found in bundle: {}", path))?;
        let node = &self.bundle.nodes()[*index];

        let content = self
            .bundle
            .extract(node)
            .with_context(|| format!("Failed to extract node: {}", path))?;
        Ok(content)
    }

    /// Read every node, yielding per-node results so one bad entry doesn't
    /// abort the rest.
    pub fn read_all(&self) -> impl Iterator<Item = (&Node, Result<Bytes>)> + '_ {
        self.bundle
            .nodes()
            .iter()
            .map(|n| (n, self.bundle.extract(n).map_err(Into::into)))
    }
}
