//! File allocation table: loading and cluster-chain walking.

use alloc::vec::Vec;

use crate::device::BlockDevice;
use crate::error::{Error, IoError};
use crate::geometry::Geometry;

/// Only the low 28 bits of an entry are significant.
pub const ENTRY_MASK:   u32 = 0x0FFF_FFFF;
/// Entries at or above this value end a chain.
pub const END_OF_CHAIN: u32 = 0x0FFF_FFF8;
pub const BAD_CLUSTER:  u32 = 0x0FFF_FFF7;

/// In-memory copy of the first FAT, one masked entry per cluster number.
/// Immutable after load; shared by every request of a mount session.
pub struct FatTable {
    entries: Vec<u32>,
}

impl FatTable {
    /// Read the entries for clusters `0..=geometry.max_cluster` from the first FAT.
    pub fn load<D: BlockDevice>(device: &D, geometry: &Geometry) -> Result<Self, IoError> {
        let count = geometry.max_cluster as usize + 1;
        let mut raw = alloc::vec![0u8; count * 4];
        device.read_at(geometry.fat_offset, &mut raw)?;
        let entries = raw
            .chunks_exact(4)
            .map(|e| u32::from_le_bytes([e[0], e[1], e[2], e[3]]))
            .collect();
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(mut entries: Vec<u32>) -> Self {
        for e in &mut entries {
            *e &= ENTRY_MASK;
        }
        Self { entries }
    }

    /// Number of entries, including the two reserved ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lazily walk the chain that starts at `start`.
    pub fn chain(&self, start: u32) -> Chain<'_> {
        let state = if self.is_link(start) {
            State::Next(start)
        } else {
            State::Failed(Error::CorruptChain { cluster: 0, next: start })
        };
        Chain { fat: self, state, tortoise: start, power: 1, lam: 0 }
    }

    fn is_link(&self, cluster: u32) -> bool {
        cluster >= 2 && (cluster as usize) < self.entries.len()
    }
}

enum State {
    Next(u32),
    Failed(Error),
    Done,
}

/// Iterator over the clusters of one chain.
///
/// Yields each cluster in order and stops after the cluster whose entry is an
/// end-of-chain marker. A link to a reserved, bad or out-of-range cluster, or
/// a loop, ends the walk with [`Error::CorruptChain`].
///
/// Loops are found with Brent's algorithm: a parked cluster is compared with
/// each link and moved forward at power-of-two step counts, so a cycle is
/// reported within a few laps of it, in constant memory.
pub struct Chain<'a> {
    fat:      &'a FatTable,
    state:    State,
    tortoise: u32,
    power:    usize,
    lam:      usize,
}

impl Iterator for Chain<'_> {
    type Item = Result<u32, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = match core::mem::replace(&mut self.state, State::Done) {
            State::Next(c)   => c,
            State::Failed(e) => return Some(Err(e)),
            State::Done      => return None,
        };
        let next = self.fat.entries[current as usize];
        if next >= END_OF_CHAIN {
            return Some(Ok(current));
        }
        if next == current || next == BAD_CLUSTER || !self.fat.is_link(next) || self.loops_back(next) {
            log::warn!("vfat: corrupt chain: cluster {current} links to {next:#x}");
            self.state = State::Failed(Error::CorruptChain { cluster: current, next });
        } else {
            log::trace!("vfat: chain {current} -> {next}");
            self.state = State::Next(next);
        }
        Some(Ok(current))
    }
}

impl Chain<'_> {
    fn loops_back(&mut self, next: u32) -> bool {
        if next == self.tortoise {
            return true;
        }
        self.lam += 1;
        if self.lam == self.power {
            self.tortoise = next;
            self.power *= 2;
            self.lam = 0;
        }
        false
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
