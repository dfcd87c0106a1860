//! The three path-based operations served to the host layer.
//!
//! Every request is independent: it resolves its path from the root, reads
//! what it needs and returns. A failed request leaves the session as it was.

use alloc::vec::Vec;

use vfat_api_types::{FileKind, Stat};

use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::path::Node;
use crate::volume::Vfat;

const STAT_BLOCK: u64 = 512;

impl<D: BlockDevice> Vfat<D> {
    /// Attributes of the file or directory at `path`.
    pub fn getattr(&self, path: &str) -> Result<Stat> {
        self.resolve(path)
            .map(|node| self.stat(&node))
            .inspect_err(|e| report("getattr", path, e))
    }

    /// Entries of the directory at `path`, in on-disk order.
    pub fn listdir(&self, path: &str) -> Result<Vec<vfat_api_types::DirEntry>> {
        self.list(path).inspect_err(|e| report("listdir", path, e))
    }

    /// Read up to `buf.len()` bytes of the file at `path`, starting at `offset`.
    pub fn read(&self, path: &str, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.read_node(path, offset, buf).inspect_err(|e| report("read", path, e))
    }

    /// Like [`Vfat::read`], returning the bytes read.
    pub fn read_to_vec(&self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = alloc::vec![0u8; len];
        let n = self.read(path, offset, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    pub fn stat(&self, node: &Node) -> Stat {
        let options = self.options();
        match node {
            Node::Root { .. } => Stat {
                kind:   FileKind::Directory,
                size:   0,
                mode:   options.dir_mode,
                nlink:  1,
                uid:    options.uid,
                gid:    options.gid,
                blocks: 0,
                atime:  options.mount_time,
                mtime:  options.mount_time,
                ctime:  options.mount_time,
            },
            Node::Entry(entry) => {
                let cluster = u64::from(self.geometry().cluster_size);
                let size = u64::from(entry.size);
                Stat {
                    kind:   entry.kind(),
                    size,
                    mode:   if entry.is_dir() { options.dir_mode } else { options.file_mode },
                    nlink:  1,
                    uid:    options.uid,
                    gid:    options.gid,
                    blocks: size.div_ceil(cluster) * cluster / STAT_BLOCK,
                    atime:  entry.accessed.unix_seconds(),
                    mtime:  entry.modified.unix_seconds(),
                    ctime:  entry.created.unix_seconds(),
                }
            }
        }
    }

    fn list(&self, path: &str) -> Result<Vec<vfat_api_types::DirEntry>> {
        let node = self.resolve(path)?;
        if !node.is_dir() {
            return Err(Error::NotDir);
        }
        self.entries(node.cluster())
            .map(|entry| entry.map(|e| e.to_api()))
            .collect()
    }

    fn read_node(&self, path: &str, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match self.resolve(path)? {
            Node::Root { .. } => Err(Error::IsDir),
            Node::Entry(e) if e.is_dir() => Err(Error::IsDir),
            Node::Entry(e) => self.read_file(e.cluster, e.size, offset, buf),
        }
    }
}

fn report(op: &str, path: &str, err: &Error) {
    match err {
        Error::NotFound | Error::NotDir | Error::IsDir => log::debug!("vfat: {op} {path:?}: {err}"),
        _ => log::warn!("vfat: {op} {path:?}: {err}"),
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
