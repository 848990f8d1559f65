mod board;
mod mmap;

pub use self::board::{BoardRegisters, BoardView, CropWindow};
pub use self::mmap::{DevMem, DumpMapper, MappedRegion, Mapping};

use std::{io, result};

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug,Error)]
pub enum Error {
    #[error("failed to open /dev/mem: {0}")]
    OpenDevMem(io::Error),
    #[error("failed to map physical range 0x{address:x}, {size} bytes: {err}")]
    MapFailed {
        address: u64,
        size: usize,
        err: io::Error,
    },
}
