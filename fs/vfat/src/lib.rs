//! Read-only FAT32 driver.
//!
//! Mount a volume with [`Vfat::mount`], then serve path-based requests with
//! [`Vfat::getattr`], [`Vfat::listdir`] and [`Vfat::read`]. Short (8.3) names
//! only; long-name records are skipped.
//!
//! All disk I/O goes through [`BlockDevice`], so the engine runs against a
//! disk image, a raw device or an in-memory buffer alike.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod boot;
pub mod device;
pub mod dir;
mod error;
pub mod fat;
mod file;
pub mod geometry;
mod ops;
pub mod path;
pub mod time;
mod volume;

#[cfg(test)]
mod testing;

pub use boot::BootSector;
pub use device::BlockDevice;
#[cfg(feature = "std")]
pub use device::Serialized;
pub use dir::{Attributes, DirEntry, ShortName};
pub use error::{Error, IoError, Result, StructureError};
pub use geometry::Geometry;
pub use path::Node;
pub use volume::{MountOptions, Vfat};
