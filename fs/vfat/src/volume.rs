//! Mount session: validated boot sector, geometry, FAT and device.

use crate::boot::{BOOT_SECTOR_SIZE, BootSector};
use crate::device::BlockDevice;
use crate::error::{Error, IoError, Result};
use crate::fat::FatTable;
use crate::geometry::Geometry;

/// Per-mount attributes that FAT does not store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountOptions {
    pub uid:        u32,
    pub gid:        u32,
    /// Unix seconds; reported as every timestamp of the root directory.
    pub mount_time: i64,
    pub file_mode:  u32,
    pub dir_mode:   u32,
}

impl MountOptions {
    pub const fn new() -> Self {
        Self { uid: 0, gid: 0, mount_time: 0, file_mode: 0o444, dir_mode: 0o555 }
    }

    pub const fn owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    pub const fn mount_time(mut self, unix_seconds: i64) -> Self {
        self.mount_time = unix_seconds;
        self
    }
}

impl Default for MountOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A mounted, read-only FAT32 volume.
///
/// Everything is immutable after [`Vfat::mount`], so `&Vfat` can serve
/// requests from many threads at once when `D: Sync`.
pub struct Vfat<D> {
    boot:     BootSector,
    geometry: Geometry,
    fat:      FatTable,
    options:  MountOptions,
    device:   D,
}

impl<D: BlockDevice> Vfat<D> {
    /// Validate the boot sector and load the first FAT.
    pub fn mount(device: D, options: MountOptions) -> Result<Self> {
        let mut sector = [0u8; BOOT_SECTOR_SIZE];
        device.read_at(0, &mut sector).inspect_err(|e| log::warn!("vfat: mount: {e}"))?;
        let boot = BootSector::parse(&sector).map_err(|e| {
            log::warn!("vfat: mount: rejected boot sector: {e}");
            Error::Structure(e)
        })?;
        let geometry = Geometry::new(&boot);
        let fat = FatTable::load(&device, &geometry).inspect_err(|e| log::warn!("vfat: mount: FAT: {e}"))?;

        log::info!(
            "vfat: mounted {:?}: {} clusters of {} bytes, root at {}",
            core::str::from_utf8(boot.label()).unwrap_or("?"),
            boot.cluster_count(),
            geometry.cluster_size,
            boot.root_cluster,
        );
        log::debug!(
            "vfat: fat at {:#x} ({} bytes), data at {:#x}",
            geometry.fat_offset,
            geometry.fat_size,
            geometry.data_offset,
        );
        Ok(Self { boot, geometry, fat, options, device })
    }

    /// End the session and hand the device back.
    pub fn unmount(self) -> D {
        log::info!("vfat: unmounted");
        self.device
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn fat(&self) -> &FatTable {
        &self.fat
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    pub fn root_cluster(&self) -> u32 {
        self.boot.root_cluster
    }

    pub fn volume_label(&self) -> &[u8] {
        self.boot.label()
    }

    /// Read the whole of `cluster`; `buf` must be one cluster long.
    pub(crate) fn read_cluster(&self, cluster: u32, buf: &mut [u8]) -> Result<(), IoError> {
        debug_assert_eq!(buf.len(), self.geometry.cluster_size as usize);
        self.read_in_cluster(cluster, 0, buf)
    }

    /// Read `buf.len()` bytes starting `start` bytes into `cluster`.
    pub(crate) fn read_in_cluster(&self, cluster: u32, start: usize, buf: &mut [u8]) -> Result<(), IoError> {
        debug_assert!(start + buf.len() <= self.geometry.cluster_size as usize);
        self.device.read_at(self.geometry.cluster_offset(cluster) + start as u64, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructureError;
    use crate::testing::{ImageBuilder, SparseDisk};

    #[test]
    fn mount_reads_geometry_and_label() {
        let vfat = Vfat::mount(ImageBuilder::new().build(), MountOptions::default()).unwrap();
        assert_eq!(vfat.root_cluster(), 2);
        assert_eq!(vfat.volume_label(), b"TESTVOL");
        assert_eq!(vfat.geometry().cluster_size, 512);
        assert_eq!(vfat.fat().len(), vfat.geometry().max_cluster as usize + 1);
    }

    #[test]
    fn mount_rejects_non_fat32() {
        let mut disk = ImageBuilder::new().build();
        disk.write(16, &[1]);
        assert!(matches!(
            Vfat::mount(disk, MountOptions::default()),
            Err(Error::Structure(StructureError::FatCount(1)))
        ));
    }

    #[test]
    fn mount_fails_on_truncated_device() {
        assert!(matches!(
            Vfat::mount(SparseDisk::new(100), MountOptions::default()),
            Err(Error::Io(IoError::ShortRead { .. }))
        ));
    }

    #[test]
    fn mount_fails_when_fat_is_cut_short() {
        // A valid boot sector on a device that ends inside the FAT.
        let mut disk = SparseDisk::new(32 * 512 + 1024);
        disk.write(0, &ImageBuilder::new().boot_sector());
        assert!(matches!(Vfat::mount(disk, MountOptions::default()), Err(Error::Io(_))));
    }

    #[test]
    fn options_are_kept() {
        let options = MountOptions::new().owner(1000, 100).mount_time(1_700_000_000);
        let vfat = Vfat::mount(ImageBuilder::new().build(), options).unwrap();
        assert_eq!(vfat.options().uid, 1000);
        assert_eq!(vfat.options().gid, 100);
        assert_eq!(vfat.options().mount_time, 1_700_000_000);
        assert_eq!(vfat.options().file_mode, 0o444);
    }

    #[test]
    fn unmount_returns_the_device() {
        let vfat = Vfat::mount(ImageBuilder::new().build(), MountOptions::default()).unwrap();
        let disk = vfat.unmount();
        let mut sig = [0u8; 2];
        disk.read_at(510, &mut sig).unwrap();
        assert_eq!(sig, [0x55, 0xAA]);
    }
}
