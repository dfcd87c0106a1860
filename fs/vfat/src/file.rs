use crate::device::BlockDevice;
use crate::error::Result;
use crate::volume::Vfat;

impl<D: BlockDevice> Vfat<D> {
    /// Copy file bytes `offset..` into `buf`, bounded by `file_size`.
    ///
    /// Returns the number of bytes copied: `min(buf.len(), file_size - offset)`,
    /// or 0 when `offset` is at or past the end. The chain is only walked as far
    /// as the requested range needs. A chain that ends before the range does
    /// yields a short count.
    pub fn read_file(&self, start_cluster: u32, file_size: u32, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let size = u64::from(file_size);
        if offset >= size || buf.is_empty() {
            return Ok(0);
        }
        let want = (size - offset).min(buf.len() as u64) as usize;
        let cluster_size = u64::from(self.geometry().cluster_size);
        let skip = (offset / cluster_size) as usize;
        let mut in_cluster = (offset % cluster_size) as usize;

        let mut done = 0;
        for (index, cluster) in self.fat().chain(start_cluster).enumerate() {
            // Links before the range are still checked.
            let cluster = cluster?;
            if index < skip {
                continue;
            }
            let n = (cluster_size as usize - in_cluster).min(want - done);
            self.read_in_cluster(cluster, in_cluster, &mut buf[done..done + n])?;
            done += n;
            in_cluster = 0;
            if done == want {
                break;
            }
        }
        if done < want {
            log::warn!("vfat: chain at {start_cluster} ends after {done} of {want} bytes");
        }
        Ok(done)
    }
}
