//! Extended stat records.
//!
//! `Statx` mirrors the statx(2) record: every field is always present in
//! memory, and `mask` advertises which of them actually hold meaningful
//! data. Backends store and return the mask alongside the fields so that
//! partial records (from scanners that could not stat everything, or from
//! projected query results) stay self-describing.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which fields of a `Statx` record are meaningful.
    ///
    /// Bit values match the `STATX_*` constants of statx(2).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StatxMask: u32 {
        const TYPE = 0x0001;
        const MODE = 0x0002;
        const NLINK = 0x0004;
        const UID = 0x0008;
        const GID = 0x0010;
        const ATIME = 0x0020;
        const MTIME = 0x0040;
        const CTIME = 0x0080;
        const INO = 0x0100;
        const SIZE = 0x0200;
        const BLOCKS = 0x0400;
        const BASIC_STATS = 0x07ff;
        const BTIME = 0x0800;
        const ALL = 0x0fff;
    }
}

/// A timestamp with nanosecond precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatxTimestamp {
    /// Seconds since the Unix epoch.
    pub sec: i64,
    /// Nanoseconds past `sec`.
    pub nsec: u32,
}

impl StatxTimestamp {
    /// Create a timestamp from whole seconds.
    pub fn from_secs(sec: i64) -> Self {
        Self { sec, nsec: 0 }
    }
}

/// File type bits, as found in the high bits of `Statx::mode`.
pub mod file_type {
    /// Mask extracting the file type from a mode.
    pub const MASK: u16 = 0o170000;
    pub const SOCKET: u16 = 0o140000;
    pub const SYMLINK: u16 = 0o120000;
    pub const REGULAR: u16 = 0o100000;
    pub const BLOCK_DEVICE: u16 = 0o060000;
    pub const DIRECTORY: u16 = 0o040000;
    pub const CHAR_DEVICE: u16 = 0o020000;
    pub const FIFO: u16 = 0o010000;
}

/// An extended stat record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statx {
    /// Which of the following fields are meaningful.
    pub mask: StatxMask,
    pub blksize: u32,
    pub attributes: u64,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    /// File type and permission bits.
    pub mode: u16,
    pub ino: u64,
    pub size: u64,
    pub blocks: u64,
    pub attributes_mask: u64,
    pub atime: StatxTimestamp,
    pub btime: StatxTimestamp,
    pub ctime: StatxTimestamp,
    pub mtime: StatxTimestamp,
    pub rdev_major: u32,
    pub rdev_minor: u32,
    pub dev_major: u32,
    pub dev_minor: u32,
}

impl Statx {
    /// The file type bits of `mode`, if `TYPE` is advertised.
    pub fn file_type(&self) -> Option<u16> {
        if self.mask.contains(StatxMask::TYPE) {
            Some(self.mode & file_type::MASK)
        } else {
            None
        }
    }

    /// Check whether this record describes a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.file_type() == Some(file_type::SYMLINK)
    }

    /// Restrict the record to the fields in `mask`.
    ///
    /// Fields whose bit is cleared keep their in-memory value but are no
    /// longer advertised; readers must consult `mask` before trusting a
    /// field.
    pub fn project(&self, mask: StatxMask) -> Statx {
        Statx {
            mask: self.mask & mask,
            ..self.clone()
        }
    }
}
