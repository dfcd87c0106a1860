//! Block device abstraction.
//!
//! Reads are positioned: every call names its own byte offset, so one device
//! can serve concurrent requests without a shared cursor. Readers that only
//! offer seek-then-read go behind [`Serialized`].

use alloc::vec::Vec;

use crate::error::IoError;

pub trait BlockDevice {
    /// Fill `buf` with the bytes starting at `offset`. A device that ends
    /// before `buf` is full reports [`IoError::ShortRead`].
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError>;
}

impl BlockDevice for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        let start = usize::try_from(offset).map_err(|_| IoError::Device { offset })?;
        let avail = self.len().saturating_sub(start);
        if avail < buf.len() {
            return Err(IoError::ShortRead { offset, wanted: buf.len(), got: avail });
        }
        buf.copy_from_slice(&self[start..start + buf.len()]);
        Ok(())
    }
}

impl BlockDevice for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        self.as_slice().read_at(offset, buf)
    }
}

impl<T: BlockDevice + ?Sized> BlockDevice for &T {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        (**self).read_at(offset, buf)
    }
}

#[cfg(feature = "std")]
pub use host::Serialized;

#[cfg(feature = "std")]
mod host {
    use std::io::{self, Read, Seek, SeekFrom};

    use super::BlockDevice;
    use crate::error::IoError;

    /// `pread` on the open image; no cursor is shared between callers.
    #[cfg(unix)]
    impl BlockDevice for std::fs::File {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
            use std::os::unix::fs::FileExt;

            let mut done = 0;
            while done < buf.len() {
                match FileExt::read_at(self, &mut buf[done..], offset + done as u64) {
                    Ok(0) => return Err(IoError::ShortRead { offset, wanted: buf.len(), got: done }),
                    Ok(n) => done += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        log::warn!("vfat: read of {} bytes at {offset:#x} failed: {e}", buf.len());
                        return Err(IoError::Device { offset });
                    }
                }
            }
            Ok(())
        }
    }

    /// Adapter for readers with an implicit cursor: every seek+read pair runs
    /// under one lock so concurrent requests cannot interleave.
    pub struct Serialized<R> {
        inner: spin::Mutex<R>,
    }

    impl<R> Serialized<R> {
        pub const fn new(reader: R) -> Self {
            Self { inner: spin::Mutex::new(reader) }
        }

        pub fn into_inner(self) -> R {
            self.inner.into_inner()
        }
    }

    impl<R: Read + Seek> BlockDevice for Serialized<R> {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
            let mut reader = self.inner.lock();
            reader.seek(SeekFrom::Start(offset)).map_err(|_| IoError::Device { offset })?;
            let mut done = 0;
            while done < buf.len() {
                match reader.read(&mut buf[done..]) {
                    Ok(0) => return Err(IoError::ShortRead { offset, wanted: buf.len(), got: done }),
                    Ok(n) => done += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(_) => return Err(IoError::Device { offset }),
                }
            }
            Ok(())
        }
    }
}
