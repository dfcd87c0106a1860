//! Types shared between the FAT32 engine and the host layer that serves
//! `getattr` / `readdir` / `read` requests on its behalf.
#![no_std]

#[cfg(test)]
extern crate std;

// POSIX error numbers the host layer hands back to the kernel.
pub const ENOENT:  i32 = 2;
pub const EIO:     i32 = 5;
pub const ENOTDIR: i32 = 20;
pub const EISDIR:  i32 = 21;

pub const S_IFDIR: u32 = 0o040_000;
pub const S_IFREG: u32 = 0o100_000;

/// Longest short name: 8 name bytes, a dot, 3 extension bytes.
pub const MAX_NAME_LEN: usize = 12;

/// Result codes returned by the filesystem operations.
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsResult {
    Ok       = 0,
    NotFound = 1,
    IsDir    = 2,
    NotDir   = 3,
    IoError  = 5,
}

impl FsResult {
    pub fn from_u64(v: u64) -> Self {
        match v {
            0 => FsResult::Ok,
            1 => FsResult::NotFound,
            2 => FsResult::IsDir,
            3 => FsResult::NotDir,
            _ => FsResult::IoError,
        }
    }

    /// Positive errno for the host layer; `0` for `Ok`.
    pub fn errno(self) -> i32 {
        match self {
            FsResult::Ok       => 0,
            FsResult::NotFound => ENOENT,
            FsResult::IsDir    => EISDIR,
            FsResult::NotDir   => ENOTDIR,
            FsResult::IoError  => EIO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

impl FileKind {
    pub fn type_bits(self) -> u32 {
        match self {
            FileKind::File      => S_IFREG,
            FileKind::Directory => S_IFDIR,
        }
    }
}

/// Attributes reported for a path. Times are seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stat {
    pub kind:   FileKind,
    pub size:   u64,
    pub mode:   u32,    // permission bits only
    pub nlink:  u32,
    pub uid:    u32,
    pub gid:    u32,
    pub blocks: u64,    // 512-byte units
    pub atime:  i64,
    pub mtime:  i64,
    pub ctime:  i64,
}

impl Stat {
    /// `mode` with the file-type bits filled in, as `st_mode` expects.
    pub fn st_mode(&self) -> u32 {
        self.kind.type_bits() | self.mode
    }
}

/// A single directory listing item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name:       [u8; MAX_NAME_LEN],
    pub name_len:   u8,
    pub kind:       FileKind,
    pub attributes: u8,     // raw FAT attribute byte
    pub size:       u32,
}

impl DirEntry {
    pub fn name(&self) -> &[u8] {
        &self.name[..self.name_len as usize]
    }

    /// The name as text, if it is valid UTF-8 (short names are usually ASCII).
    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(self.name()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes_round_trip_through_u64() {
        for r in [FsResult::Ok, FsResult::NotFound, FsResult::IsDir, FsResult::NotDir, FsResult::IoError] {
            assert_eq!(FsResult::from_u64(r as u64), r);
        }
        assert_eq!(FsResult::from_u64(4), FsResult::IoError);
    }

    #[test]
    fn errno_mapping() {
        assert_eq!(FsResult::Ok.errno(), 0);
        assert_eq!(FsResult::NotFound.errno(), ENOENT);
        assert_eq!(FsResult::IoError.errno(), EIO);
        assert_eq!(FsResult::NotDir.errno(), ENOTDIR);
        assert_eq!(FsResult::IsDir.errno(), EISDIR);
    }

    #[test]
    fn st_mode_includes_type_bits() {
        let st = Stat {
            kind: FileKind::Directory, size: 0, mode: 0o555, nlink: 1, uid: 0, gid: 0,
            blocks: 0, atime: 0, mtime: 0, ctime: 0,
        };
        assert_eq!(st.st_mode(), S_IFDIR | 0o555);
    }

    #[test]
    fn dir_entry_name_slices_to_len() {
        let mut name = [0u8; MAX_NAME_LEN];
        name[..5].copy_from_slice(b"A.TXT");
        let e = DirEntry { name, name_len: 5, kind: FileKind::File, attributes: 0x20, size: 5 };
        assert_eq!(e.name(), b"A.TXT");
        assert_eq!(e.name_str(), Some("A.TXT"));
    }
}
