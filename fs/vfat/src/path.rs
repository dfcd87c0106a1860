//! Absolute path resolution against the directory tree.

use crate::device::BlockDevice;
use crate::dir::DirEntry;
use crate::error::{Error, Result};
use crate::volume::Vfat;

/// Non-empty components of `path`. Leading, trailing and repeated slashes
/// contribute nothing, so `"/"`, `""` and `"//"` all name the root.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// What a path resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    /// The root directory, which has no entry of its own.
    Root { cluster: u32 },
    Entry(DirEntry),
}

impl Node {
    /// First cluster of the node's data.
    pub fn cluster(&self) -> u32 {
        match self {
            Node::Root { cluster } => *cluster,
            Node::Entry(e) => e.cluster,
        }
    }

    pub fn is_dir(&self) -> bool {
        match self {
            Node::Root { .. } => true,
            Node::Entry(e) => e.is_dir(),
        }
    }
}

impl<D: BlockDevice> Vfat<D> {
    /// Walk `path` from the root one component at a time.
    pub fn resolve(&self, path: &str) -> Result<Node> {
        let root = Node::Root { cluster: self.root_cluster() };
        let node = components(path).try_fold(root, |parent, name| {
            if !parent.is_dir() {
                return Err(Error::NotDir);
            }
            self.lookup(parent.cluster(), name).map(Node::Entry)
        })?;
        log::trace!("vfat: resolved {path:?} to cluster {}", node.cluster());
        Ok(node)
    }

    /// Find `name` among the entries of the directory at `dir_cluster`.
    ///
    /// A `..` entry with first cluster 0 (in a top-level directory) is
    /// rewritten to point at the root. Any other entry keeps cluster 0, which
    /// fails as a corrupt chain once it is read.
    pub fn lookup(&self, dir_cluster: u32, name: &str) -> Result<DirEntry> {
        for entry in self.entries(dir_cluster) {
            let mut entry = entry?;
            if entry.name.matches(name) {
                if entry.is_dir() && entry.cluster == 0 && entry.name.as_bytes() == b".." {
                    entry.cluster = self.root_cluster();
                }
                return Ok(entry);
            }
        }
        log::debug!("vfat: {name:?} not found in directory at cluster {dir_cluster}");
        Err(Error::NotFound)
    }
}
