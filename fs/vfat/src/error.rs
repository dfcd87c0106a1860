use core::fmt;
use vfat_api_types::FsResult;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Why a boot sector was rejected. Each check gets its own variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureError {
    BytesPerSector(u16),
    SectorsPerCluster(u8),
    ClusterSize(u32),
    FatCount(u8),
    RootEntryCount(u16),
    TotalSectors16(u16),
    FatSize16(u16),
    Version(u16),
    Signature(u16),
    ReservedNotZero,
    ClusterCount(u32),
    /// The FAT cannot hold an entry for every data cluster.
    FatTooSmall { entries: u64, clusters: u32 },
    RootCluster(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoError {
    /// The device ended before `wanted` bytes could be read.
    ShortRead { offset: u64, wanted: usize, got: usize },
    /// The device reported a failure.
    Device { offset: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The boot sector is not a FAT32 volume we accept. Fatal at mount.
    Structure(StructureError),
    Io(IoError),
    /// The FAT entry of `cluster` links to `next`, which is not a valid chain
    /// step. `cluster == 0` means the bad link came from a directory entry.
    CorruptChain { cluster: u32, next: u32 },
    NotFound,
    NotDir,
    IsDir,
}

impl Error {
    pub fn result(&self) -> FsResult {
        match self {
            Error::NotFound => FsResult::NotFound,
            Error::NotDir   => FsResult::NotDir,
            Error::IsDir    => FsResult::IsDir,
            Error::Structure(_) | Error::Io(_) | Error::CorruptChain { .. } => FsResult::IoError,
        }
    }

    pub fn errno(&self) -> i32 {
        self.result().errno()
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<StructureError> for Error {
    fn from(e: StructureError) -> Self {
        Error::Structure(e)
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::BytesPerSector(n)    => write!(f, "invalid bytes per sector: {n}"),
            Self::SectorsPerCluster(n) => write!(f, "invalid sectors per cluster: {n}"),
            Self::ClusterSize(n)       => write!(f, "cluster size {n} is not below 32768 bytes"),
            Self::FatCount(n)          => write!(f, "expected 2 FATs, found {n}"),
            Self::RootEntryCount(n)    => write!(f, "root entry count is {n}, not a FAT32 volume"),
            Self::TotalSectors16(n)    => write!(f, "16-bit total sectors is {n}, not a FAT32 volume"),
            Self::FatSize16(n)         => write!(f, "16-bit FAT size is {n}, not a FAT32 volume"),
            Self::Version(v)           => write!(f, "unsupported FAT32 version {v:#06x}"),
            Self::Signature(s)         => write!(f, "bad boot signature {s:#06x}"),
            Self::ReservedNotZero      => f.write_str("reserved boot sector area is not zero"),
            Self::ClusterCount(n)      => write!(f, "{n} data clusters is outside the FAT32 range"),
            Self::FatTooSmall { entries, clusters } => {
                write!(f, "FAT holds {entries} entries but the volume has {clusters} clusters")
            }
            Self::RootCluster(c)       => write!(f, "root cluster {c} is outside the data region"),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ShortRead { offset, wanted, got } => {
                write!(f, "short read at {offset:#x}: wanted {wanted} bytes, got {got}")
            }
            Self::Device { offset } => write!(f, "device read failed at {offset:#x}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Structure(e) => write!(f, "invalid FAT32 boot sector: {e}"),
            Error::Io(e)        => write!(f, "I/O error: {e}"),
            Error::CorruptChain { cluster, next } => {
                write!(f, "corrupt cluster chain: {cluster} links to {next:#x}")
            }
            Error::NotFound     => f.write_str("no such file or directory"),
            Error::NotDir       => f.write_str("not a directory"),
            Error::IsDir        => f.write_str("is a directory"),
        }
    }
}

impl core::error::Error for StructureError {}
impl core::error::Error for IoError {}
impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use vfat_api_types::{EIO, EISDIR, ENOENT, ENOTDIR};

    #[test]
    fn not_found_maps_to_enoent() {
        assert_eq!(Error::NotFound.errno(), ENOENT);
    }

    #[test]
    fn device_and_chain_failures_map_to_eio() {
        assert_eq!(Error::Io(IoError::Device { offset: 0 }).errno(), EIO);
        assert_eq!(Error::CorruptChain { cluster: 3, next: 3 }.errno(), EIO);
    }

    #[test]
    fn kind_mismatches_map_to_their_errno() {
        assert_eq!(Error::NotDir.errno(), ENOTDIR);
        assert_eq!(Error::IsDir.errno(), EISDIR);
    }
}
