//! Hand-built FAT32 images for unit tests.
//!
//! A default [`ImageBuilder`] describes a 512-byte-sector, one-sector-cluster
//! volume with 65530 data clusters and the root directory at cluster 2. Only
//! the sectors that are actually written are stored.

use std::collections::BTreeMap;
use std::vec::Vec;

use crate::device::BlockDevice;
use crate::error::IoError;

const CHUNK: u64 = 512;

/// Sparse in-memory disk: unwritten bytes read as zero.
pub struct SparseDisk {
    len:    u64,
    chunks: BTreeMap<u64, [u8; CHUNK as usize]>,
}

impl SparseDisk {
    pub fn new(len: u64) -> Self {
        Self { len, chunks: BTreeMap::new() }
    }

    /// Drop everything from `len` on.
    pub fn truncate(&mut self, len: u64) {
        self.len = self.len.min(len);
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            let at = offset + i as u64;
            let chunk = self.chunks.entry(at / CHUNK).or_insert([0; CHUNK as usize]);
            chunk[(at % CHUNK) as usize] = b;
        }
    }
}

impl BlockDevice for SparseDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        let avail = self.len.saturating_sub(offset);
        if avail < buf.len() as u64 {
            return Err(IoError::ShortRead { offset, wanted: buf.len(), got: avail as usize });
        }
        buf.fill(0);
        let first = offset / CHUNK;
        let last = (offset + buf.len() as u64).div_ceil(CHUNK);
        for (&index, chunk) in self.chunks.range(first..last) {
            let chunk_start = index * CHUNK;
            let from = offset.max(chunk_start);
            let to = (offset + buf.len() as u64).min(chunk_start + CHUNK);
            buf[(from - offset) as usize..(to - offset) as usize]
                .copy_from_slice(&chunk[(from - chunk_start) as usize..(to - chunk_start) as usize]);
        }
        Ok(())
    }
}

/// Pad a name and extension to the on-disk 8.3 form.
pub fn name83(name: &str, ext: &str) -> [u8; 11] {
    let mut out = [b' '; 11];
    out[..name.len()].copy_from_slice(name.as_bytes());
    out[8..8 + ext.len()].copy_from_slice(ext.as_bytes());
    out
}

/// One 32-byte short-name directory record.
pub fn dir_entry(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut e = [0u8; 32];
    e[..11].copy_from_slice(name);
    e[11] = attr;
    e[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    e[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    e[28..32].copy_from_slice(&size.to_le_bytes());
    e
}

pub struct ImageBuilder {
    bytes_per_sector:    u16,
    sectors_per_cluster: u8,
    reserved_sectors:    u16,
    sectors_per_fat:     u32,
    clusters:            u32,
    total_sectors:       Option<u32>,
    root_cluster:        u32,
    fat:                 BTreeMap<u32, u32>,
    data:                BTreeMap<u32, Vec<u8>>,
}

impl ImageBuilder {
    pub fn new() -> Self {
        let mut fat = BTreeMap::new();
        fat.insert(0, 0x0FFF_FFF8);
        fat.insert(1, 0x0FFF_FFFF);
        fat.insert(2, 0x0FFF_FFFF);
        Self {
            bytes_per_sector:    512,
            sectors_per_cluster: 1,
            reserved_sectors:    32,
            sectors_per_fat:     512,
            clusters:            65_530,
            total_sectors:       None,
            root_cluster:        2,
            fat,
            data:                BTreeMap::new(),
        }
    }

    pub fn bytes_per_sector(mut self, bps: u16) -> Self {
        self.bytes_per_sector = bps;
        self
    }

    pub fn sectors_per_cluster(mut self, spc: u8) -> Self {
        self.sectors_per_cluster = spc;
        self
    }

    /// Override the derived total; the cluster count follows from it.
    pub fn total_sectors(mut self, total: u32) -> Self {
        self.total_sectors = Some(total);
        self
    }

    pub fn cluster_size(&self) -> usize {
        usize::from(self.bytes_per_sector) * usize::from(self.sectors_per_cluster)
    }

    fn total(&self) -> u32 {
        self.total_sectors.unwrap_or_else(|| {
            u32::from(self.reserved_sectors)
                + 2 * self.sectors_per_fat
                + self.clusters * u32::from(self.sectors_per_cluster)
        })
    }

    /// Set the FAT entry of `cluster`.
    pub fn link(&mut self, cluster: u32, next: u32) {
        self.fat.insert(cluster, next);
    }

    /// Link `clusters` in order and terminate the last one.
    pub fn chain(&mut self, clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.link(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.link(last, 0x0FFF_FFFF);
        }
    }

    pub fn cluster_data(&mut self, cluster: u32, bytes: &[u8]) {
        assert!(bytes.len() <= self.cluster_size(), "data larger than a cluster");
        self.data.insert(cluster, bytes.to_vec());
    }

    /// Write `entries` at the start of `cluster`; the rest stays zero.
    pub fn directory(&mut self, cluster: u32, entries: &[[u8; 32]]) {
        let bytes: Vec<u8> = entries.iter().flatten().copied().collect();
        self.cluster_data(cluster, &bytes);
    }

    /// Spread `bytes` over `clusters`, linking them into one chain.
    pub fn file(&mut self, clusters: &[u32], bytes: &[u8]) {
        self.chain(clusters);
        let size = self.cluster_size();
        for (&cluster, part) in clusters.iter().zip(bytes.chunks(size)) {
            self.cluster_data(cluster, part);
        }
    }

    pub fn boot_sector(&self) -> [u8; 512] {
        let mut s = [0u8; 512];
        s[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        s[3..11].copy_from_slice(b"MSWIN4.1");
        s[11..13].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        s[13] = self.sectors_per_cluster;
        s[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        s[16] = 2;
        s[21] = 0xF8;
        s[24..26].copy_from_slice(&63u16.to_le_bytes());
        s[26..28].copy_from_slice(&255u16.to_le_bytes());
        s[32..36].copy_from_slice(&self.total().to_le_bytes());
        s[36..40].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        s[44..48].copy_from_slice(&self.root_cluster.to_le_bytes());
        s[48..50].copy_from_slice(&1u16.to_le_bytes());
        s[50..52].copy_from_slice(&6u16.to_le_bytes());
        s[64] = 0x80;
        s[66] = 0x29;
        s[67..71].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        s[71..82].copy_from_slice(b"TESTVOL    ");
        s[82..90].copy_from_slice(b"FAT32   ");
        s[510] = 0x55;
        s[511] = 0xAA;
        s
    }

    pub fn build(&self) -> SparseDisk {
        let bps = u64::from(self.bytes_per_sector);
        let mut disk = SparseDisk::new(u64::from(self.total()) * bps);
        disk.write(0, &self.boot_sector());

        let fat_offset = u64::from(self.reserved_sectors) * bps;
        let fat_size = u64::from(self.sectors_per_fat) * bps;
        for copy in 0..2 {
            for (&cluster, &next) in &self.fat {
                disk.write(fat_offset + copy * fat_size + u64::from(cluster) * 4, &next.to_le_bytes());
            }
        }

        let data_offset = fat_offset + 2 * fat_size;
        let cluster_size = self.cluster_size() as u64;
        for (&cluster, bytes) in &self.data {
            disk.write(data_offset + u64::from(cluster - 2) * cluster_size, bytes);
        }
        disk
    }
}
