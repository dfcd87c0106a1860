//! Boot sector (BIOS Parameter Block) parsing and FAT32 validation.
//!
//! Validation is strict: anything that is not unambiguously FAT32 is
//! rejected with the first check it fails.

use crate::error::StructureError;

/// Bytes read from device offset 0. All BPB fields and the signature live here
/// whatever the logical sector size is.
pub const BOOT_SECTOR_SIZE: usize = 512;

const MAX_CLUSTER_SIZE:  u32 = 32 * 1024;
const MIN_CLUSTER_COUNT: u32 = 65_525;
// Keeps the highest cluster number below the bad-cluster marker.
const MAX_CLUSTER_COUNT: u32 = 0x0FFF_FFF5;
const BOOT_SIGNATURE:    u16 = 0xAA55;
const FAT_COUNT:         u8  = 2;

// ─── On-disk layout ────────────────────────────────────────────────────────────

#[repr(C, packed)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
struct RawBootSector {
    jump:               [u8; 3],
    oem:                [u8; 8],
    bytes_per_sector:   u16,
    sectors_per_clus:   u8,
    reserved_sectors:   u16,
    num_fats:           u8,
    root_entry_count:   u16,
    total_sectors_16:   u16,
    media:              u8,
    fat_size_16:        u16,
    sectors_per_track:  u16,
    num_heads:          u16,
    hidden_sectors:     u32,
    total_sectors_32:   u32,
    // FAT32 extension
    fat_size_32:        u32,
    ext_flags:          u16,
    fs_version:         u16,
    root_cluster:       u32,
    fs_info:            u16,
    backup_boot_sector: u16,
    reserved:           [u8; 12],
    drive_number:       u8,
    _reserved1:         u8,
    ext_boot_signature: u8,
    volume_id:          u32,
    volume_label:       [u8; 11],
    fs_type:            [u8; 8],
    boot_code:          [u8; 420],
    signature:          u16,
}

const _: () = assert!(core::mem::size_of::<RawBootSector>() == BOOT_SECTOR_SIZE);

// ─── Validated boot sector ─────────────────────────────────────────────────────

/// The boot sector fields the driver depends on, after validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootSector {
    pub bytes_per_sector:    u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors:    u16,
    pub fat_count:           u8,
    pub total_sectors:       u32,
    pub sectors_per_fat:     u32,
    pub root_cluster:        u32,
    pub volume_label:        [u8; 11],
}

impl BootSector {
    /// Parse and validate the first sector of a volume.
    pub fn parse(sector: &[u8; BOOT_SECTOR_SIZE]) -> Result<Self, StructureError> {
        // SAFETY: `RawBootSector` is exactly BOOT_SECTOR_SIZE bytes of plain
        // integers with alignment 1, so every bit pattern is a valid value.
        let raw: RawBootSector =
            unsafe { core::ptr::read_unaligned(sector.as_ptr() as *const RawBootSector) };

        let bytes_per_sector = u16::from_le(raw.bytes_per_sector);
        if !matches!(bytes_per_sector, 512 | 1024 | 2048 | 4096) {
            return Err(StructureError::BytesPerSector(bytes_per_sector));
        }
        let sectors_per_cluster = raw.sectors_per_clus;
        if !sectors_per_cluster.is_power_of_two() {
            return Err(StructureError::SectorsPerCluster(sectors_per_cluster));
        }
        let cluster_size = u32::from(bytes_per_sector) * u32::from(sectors_per_cluster);
        if cluster_size >= MAX_CLUSTER_SIZE {
            return Err(StructureError::ClusterSize(cluster_size));
        }
        if raw.num_fats != FAT_COUNT {
            return Err(StructureError::FatCount(raw.num_fats));
        }

        // FAT12/16 keep these legacy fields non-zero.
        let root_entry_count = u16::from_le(raw.root_entry_count);
        if root_entry_count != 0 {
            return Err(StructureError::RootEntryCount(root_entry_count));
        }
        let total_sectors_16 = u16::from_le(raw.total_sectors_16);
        if total_sectors_16 != 0 {
            return Err(StructureError::TotalSectors16(total_sectors_16));
        }
        let fat_size_16 = u16::from_le(raw.fat_size_16);
        if fat_size_16 != 0 {
            return Err(StructureError::FatSize16(fat_size_16));
        }

        let version = u16::from_le(raw.fs_version);
        if version != 0 {
            return Err(StructureError::Version(version));
        }
        let signature = u16::from_le(raw.signature);
        if signature != BOOT_SIGNATURE {
            return Err(StructureError::Signature(signature));
        }
        if raw.reserved.iter().any(|&b| b != 0) {
            return Err(StructureError::ReservedNotZero);
        }

        let boot = BootSector {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors: u16::from_le(raw.reserved_sectors),
            fat_count:        raw.num_fats,
            total_sectors:    u32::from_le(raw.total_sectors_32),
            sectors_per_fat:  u32::from_le(raw.fat_size_32),
            root_cluster:     u32::from_le(raw.root_cluster),
            volume_label:     raw.volume_label,
        };

        let clusters = boot.cluster_count();
        if !(MIN_CLUSTER_COUNT..=MAX_CLUSTER_COUNT).contains(&clusters) {
            return Err(StructureError::ClusterCount(clusters));
        }
        let entries = u64::from(boot.sectors_per_fat) * u64::from(bytes_per_sector) / 4;
        if entries < u64::from(clusters) + 2 {
            return Err(StructureError::FatTooSmall { entries, clusters });
        }
        if !(2..=boot.max_cluster()).contains(&boot.root_cluster) {
            return Err(StructureError::RootCluster(boot.root_cluster));
        }
        Ok(boot)
    }

    /// Number of data clusters on the volume.
    pub fn cluster_count(&self) -> u32 {
        let meta = u64::from(self.reserved_sectors)
            + u64::from(self.sectors_per_fat) * u64::from(self.fat_count);
        let data_sectors = u64::from(self.total_sectors).saturating_sub(meta);
        (data_sectors / u64::from(self.sectors_per_cluster)) as u32
    }

    /// Highest valid cluster number; data clusters are numbered from 2.
    pub fn max_cluster(&self) -> u32 {
        self.cluster_count() + 1
    }

    /// Volume label with its space padding removed.
    pub fn label(&self) -> &[u8] {
        let end = self.volume_label.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        &self.volume_label[..end]
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
