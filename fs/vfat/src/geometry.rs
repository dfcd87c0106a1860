use crate::boot::BootSector;

/// Byte layout of a mounted volume, derived once from the boot sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub fat_offset:   u64,
    pub fat_size:     u64,
    pub data_offset:  u64,
    pub cluster_size: u32,
    pub max_cluster:  u32,
}

impl Geometry {
    pub fn new(boot: &BootSector) -> Self {
        let bps = u64::from(boot.bytes_per_sector);
        let fat_offset = u64::from(boot.reserved_sectors) * bps;
        let fat_size = u64::from(boot.sectors_per_fat) * bps;
        Self {
            fat_offset,
            fat_size,
            data_offset: fat_offset + u64::from(boot.fat_count) * fat_size,
            cluster_size: u32::from(boot.sectors_per_cluster) * u32::from(boot.bytes_per_sector),
            max_cluster: boot.max_cluster(),
        }
    }

    /// Absolute byte offset of `cluster`. The first data cluster is 2.
    pub fn cluster_offset(&self, cluster: u32) -> u64 {
        debug_assert!(cluster >= 2, "cluster {cluster} has no data");
        self.data_offset + u64::from(cluster - 2) * u64::from(self.cluster_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ImageBuilder;

    fn geometry(img: &ImageBuilder) -> Geometry {
        Geometry::new(&BootSector::parse(&img.boot_sector()).unwrap())
    }

    #[test]
    fn regions_follow_reserved_sectors_and_fats() {
        let g = geometry(&ImageBuilder::new());
        assert_eq!(g.fat_offset, 32 * 512);
        assert_eq!(g.fat_size, 512 * 512);
        assert_eq!(g.data_offset, 32 * 512 + 2 * 512 * 512);
        assert_eq!(g.cluster_size, 512);
    }

    #[test]
    fn cluster_two_starts_the_data_region() {
        let g = geometry(&ImageBuilder::new());
        assert_eq!(g.cluster_offset(2), g.data_offset);
        assert_eq!(g.cluster_offset(3), g.data_offset + 512);
    }

    #[test]
    fn cluster_size_scales_with_sector_size() {
        let g = geometry(&ImageBuilder::new().bytes_per_sector(2048).sectors_per_cluster(4));
        assert_eq!(g.cluster_size, 8192);
        assert_eq!(g.cluster_offset(10), g.data_offset + 8 * 8192);
    }
}
