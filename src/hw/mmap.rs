use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::ptr;

use memmap2::{Mmap, MmapOptions};

use crate::hw::{Error, Result};

const DEV_MEM_PATH: &str = "/dev/mem";

/// One read-only view of board physical memory. The hardware is the only
/// writer of the underlying pages.
pub trait MappedRegion: Send {
    fn as_slice(&self) -> &[u8];
}

/// Maps dump regions for a session. Object safe so sessions can be driven
/// against fake memory in tests.
pub trait DumpMapper: Send {
    fn map(&self, address: u32, size: usize) -> Result<Box<dyn MappedRegion>>;
}

/// A handle on `/dev/mem`. Every session holds its own, the board register
/// view holds another.
pub struct DevMem {
    file: File,
}

impl DevMem {
    pub fn open() -> Result<DevMem> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(DEV_MEM_PATH)
            .map_err(Error::OpenDevMem)?;
        Ok(DevMem { file })
    }

    pub fn map_range(&self, address: u64, size: usize) -> Result<Mapping> {
        let mmap = unsafe { MmapOptions::new().offset(address).len(size).map(&self.file) }
            .map_err(|err| Error::MapFailed { address, size, err })?;
        Ok(Mapping { mmap })
    }
}

impl DumpMapper for DevMem {
    fn map(&self, address: u32, size: usize) -> Result<Box<dyn MappedRegion>> {
        let mapping = self.map_range(address as u64, size)?;
        Ok(Box::new(mapping))
    }
}

/// A mapped physical range, unmapped when dropped.
pub struct Mapping {
    mmap: Mmap,
}

impl Mapping {
    /// Volatile read of the 32-bit register at word ordinal `reg`.
    pub fn read_reg(&self, reg: usize) -> u32 {
        let base = self.mmap.as_ptr() as *const u32;
        unsafe { ptr::read_volatile(base.add(reg)) }
    }
}

impl MappedRegion for Mapping {
    fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}
