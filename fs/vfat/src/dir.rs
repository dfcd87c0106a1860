//! Directory records: the 32-byte on-disk codec and the directory iterator.
//!
//! A directory is a cluster chain filled with records. Deleted records,
//! long-name fragments, volume labels and records with reserved attribute bits
//! are skipped; a record whose first byte is 0x00 ends the whole directory,
//! including any clusters after the one it sits in.

use alloc::vec::Vec;
use core::fmt::{self, Write};

use bitflags::bitflags;
use vfat_api_types::{FileKind, MAX_NAME_LEN};

use crate::device::BlockDevice;
use crate::error::Error;
use crate::fat::Chain;
use crate::time::DateTime;
use crate::volume::Vfat;

pub const ENTRY_SIZE: usize = 32;

const END_MARKER:     u8 = 0x00;
const DELETED_MARKER: u8 = 0xE5;
// A name really starting with 0xE5 is stored with 0x05 instead.
const ESCAPED_E5:     u8 = 0x05;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        /// All four low bits together mark a long-name fragment.
        const LONG_NAME = 0x0F;
        /// Reserved bits; a record carrying either is not a valid entry.
        const INVALID   = 0xC0;
    }
}

impl Attributes {
    pub fn is_long_name(self) -> bool {
        self.contains(Self::LONG_NAME)
    }
}

// ─── On-disk record (32 bytes) ─────────────────────────────────────────────────

#[repr(C, packed)]
#[derive(Clone, Copy)]
struct RawDirEntry {
    name:       [u8; 8],
    ext:        [u8; 3],
    attr:       u8,
    _nt:        u8,
    crt_tenths: u8,
    crt_time:   u16,
    crt_date:   u16,
    acc_date:   u16,
    cluster_hi: u16,
    mod_time:   u16,
    mod_date:   u16,
    cluster_lo: u16,
    size:       u32,
}

const _: () = assert!(core::mem::size_of::<RawDirEntry>() == ENTRY_SIZE);

// ─── Short names ───────────────────────────────────────────────────────────────

/// An 8.3 name as stored, without padding: `"HELLO   TXT"` is `HELLO.TXT`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    bytes: [u8; MAX_NAME_LEN],
    len:   u8,
}

impl ShortName {
    pub fn decode(name: &[u8; 8], ext: &[u8; 3]) -> Self {
        let mut bytes = [0u8; MAX_NAME_LEN];
        let mut len = name.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        bytes[..len].copy_from_slice(&name[..len]);
        if bytes[0] == ESCAPED_E5 {
            bytes[0] = DELETED_MARKER;
        }
        let ext_len = ext.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        if ext_len > 0 {
            bytes[len] = b'.';
            len += 1;
            bytes[len..len + ext_len].copy_from_slice(&ext[..ext_len]);
            len += ext_len;
        }
        Self { bytes, len: len as u8 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Exact, case-as-stored comparison with a path component.
    pub fn matches(&self, component: &str) -> bool {
        self.as_bytes() == component.as_bytes()
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.as_bytes() {
            f.write_char(if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })?;
        }
        Ok(())
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

// ─── Parsed entries ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name:       ShortName,
    pub attributes: Attributes,
    pub size:       u32,
    pub cluster:    u32,
    pub created:    DateTime,
    pub modified:   DateTime,
    pub accessed:   DateTime,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }

    pub fn kind(&self) -> FileKind {
        if self.is_dir() { FileKind::Directory } else { FileKind::File }
    }

    pub fn to_api(&self) -> vfat_api_types::DirEntry {
        let mut name = [0u8; MAX_NAME_LEN];
        let src = self.name.as_bytes();
        name[..src.len()].copy_from_slice(src);
        vfat_api_types::DirEntry {
            name,
            name_len:   src.len() as u8,
            kind:       self.kind(),
            attributes: self.attributes.bits(),
            size:       self.size,
        }
    }
}

/// Outcome of decoding one 32-byte record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Record {
    /// 0x00 lead byte: no records follow anywhere in the directory.
    End,
    Skip,
    Entry(DirEntry),
}

pub fn decode(record: &[u8]) -> Record {
    if record.len() < ENTRY_SIZE {
        return Record::End;
    }
    match record[0] {
        END_MARKER => return Record::End,
        DELETED_MARKER => return Record::Skip,
        _ => {}
    }
    // SAFETY: `record` holds at least ENTRY_SIZE bytes and `RawDirEntry` is
    // plain integers with alignment 1.
    let raw: RawDirEntry =
        unsafe { core::ptr::read_unaligned(record.as_ptr() as *const RawDirEntry) };

    let attributes = Attributes::from_bits_retain(raw.attr);
    if attributes.is_long_name()
        || attributes.contains(Attributes::VOLUME_ID)
        || attributes.intersects(Attributes::INVALID)
    {
        return Record::Skip;
    }

    Record::Entry(DirEntry {
        name: ShortName::decode(&raw.name, &raw.ext),
        attributes,
        size: u32::from_le(raw.size),
        cluster: (u32::from(u16::from_le(raw.cluster_hi)) << 16) | u32::from(u16::from_le(raw.cluster_lo)),
        created: DateTime::from_fat(u16::from_le(raw.crt_date), u16::from_le(raw.crt_time), raw.crt_tenths),
        modified: DateTime::from_fat(u16::from_le(raw.mod_date), u16::from_le(raw.mod_time), 0),
        accessed: DateTime::from_fat_date(u16::from_le(raw.acc_date)),
    })
}

/// Entries of a single cluster, in on-disk order.
pub struct ClusterEntries<'a> {
    cluster: &'a [u8],
    pos:     usize,
    end:     bool,
}

impl<'a> ClusterEntries<'a> {
    pub fn new(cluster: &'a [u8]) -> Self {
        Self::resume(cluster, 0)
    }

    fn resume(cluster: &'a [u8], pos: usize) -> Self {
        Self { cluster, pos, end: false }
    }

    /// Whether the end-of-directory marker was seen in this cluster.
    pub fn reached_end(&self) -> bool {
        self.end
    }

    fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for ClusterEntries<'_> {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        while !self.end {
            let record = self.cluster.get(self.pos..self.pos + ENTRY_SIZE)?;
            self.pos += ENTRY_SIZE;
            match decode(record) {
                Record::End => self.end = true,
                Record::Skip => {}
                Record::Entry(entry) => return Some(entry),
            }
        }
        None
    }
}

// ─── Whole directories ─────────────────────────────────────────────────────────

/// Entries of a directory across every cluster of its chain.
pub struct Entries<'v, D> {
    vfat:  &'v Vfat<D>,
    chain: Chain<'v>,
    buf:   Vec<u8>,
    pos:   usize,
    done:  bool,
}

impl<D: BlockDevice> Vfat<D> {
    /// Iterate the directory whose chain starts at `cluster`.
    pub fn entries(&self, cluster: u32) -> Entries<'_, D> {
        let size = self.geometry().cluster_size as usize;
        Entries {
            vfat:  self,
            chain: self.fat().chain(cluster),
            buf:   alloc::vec![0; size],
            pos:   size,
            done:  false,
        }
    }
}

impl<D: BlockDevice> Iterator for Entries<'_, D> {
    type Item = Result<DirEntry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.pos >= self.buf.len() {
                let cluster = match self.chain.next() {
                    Some(Ok(c)) => c,
                    Some(Err(e)) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    None => break,
                };
                if let Err(e) = self.vfat.read_cluster(cluster, &mut self.buf) {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                self.pos = 0;
            }
            let mut records = ClusterEntries::resume(&self.buf, self.pos);
            let entry = records.next();
            self.pos = records.position();
            self.done = records.reached_end();
            if entry.is_some() {
                return entry.map(Ok);
            }
        }
        self.done = true;
        None
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
