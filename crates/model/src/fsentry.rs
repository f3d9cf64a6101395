//! Filesystem entries.
//!
//! An `FsEntry` is one row of a query result: a filesystem object seen
//! through one of its namespace edges. Hard-linked entries therefore appear
//! once per edge, each row carrying that edge's parent id, name, and
//! namespace xattrs. Which fields are populated is bounded by the masks the
//! caller passed to the query; absent fields are `None` (or empty maps).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::statx::{Statx, StatxMask};
use crate::value::ValueMap;

bitflags! {
    /// Which fields of an `FsEntry` a query should populate.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EntryMask: u32 {
        const ID = 0x0001;
        const PARENT_ID = 0x0002;
        const NAME = 0x0004;
        const STATX = 0x0008;
        const SYMLINK = 0x0010;
        const NAMESPACE_XATTRS = 0x0020;
        const INODE_XATTRS = 0x0040;
        const ALL = 0x007f;
    }
}

/// A filesystem entry (file, directory, symlink, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FsEntry {
    /// The entry's id. Always populated.
    pub id: Id,
    /// The parent edge's id; the empty id for the root entry.
    pub parent_id: Option<Id>,
    /// The entry's name under that parent.
    pub name: Option<String>,
    /// Extended stat record, gated by its own mask.
    pub statx: Option<Statx>,
    /// Symlink target; present iff the entry is a symbolic link.
    pub symlink: Option<String>,
    /// Xattrs of the namespace edge the entry was reached through.
    pub ns_xattrs: Option<ValueMap>,
    /// Xattrs of the inode, shared by every hardlink.
    pub xattrs: Option<ValueMap>,
}

impl FsEntry {
    /// Create an entry with only its id set.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// The mask of populated fields.
    pub fn mask(&self) -> EntryMask {
        let mut mask: EntryMask = EntryMask::ID;
        if self.parent_id.is_some() {
            mask |= EntryMask::PARENT_ID;
        }
        if self.name.is_some() {
            mask |= EntryMask::NAME;
        }
        if self.statx.is_some() {
            mask |= EntryMask::STATX;
        }
        if self.symlink.is_some() {
            mask |= EntryMask::SYMLINK;
        }
        if self.ns_xattrs.is_some() {
            mask |= EntryMask::NAMESPACE_XATTRS;
        }
        if self.xattrs.is_some() {
            mask |= EntryMask::INODE_XATTRS;
        }
        mask
    }

    /// Check whether this row is the root (empty parent id).
    pub fn is_root(&self) -> bool {
        matches!(&self.parent_id, Some(parent_id) if parent_id.is_root())
    }

    /// Restrict the entry to the requested field masks.
    ///
    /// Fields outside `entry_mask` are dropped; the statx record, when kept,
    /// is itself restricted to `statx_mask`.
    pub fn project(self, entry_mask: EntryMask, statx_mask: StatxMask) -> FsEntry {
        FsEntry {
            id: self.id,
            parent_id: self
                .parent_id
                .filter(|_| entry_mask.contains(EntryMask::PARENT_ID)),
            name: self.name.filter(|_| entry_mask.contains(EntryMask::NAME)),
            statx: self
                .statx
                .filter(|_| entry_mask.contains(EntryMask::STATX))
                .map(|statx| statx.project(statx_mask)),
            symlink: self
                .symlink
                .filter(|_| entry_mask.contains(EntryMask::SYMLINK)),
            ns_xattrs: self
                .ns_xattrs
                .filter(|_| entry_mask.contains(EntryMask::NAMESPACE_XATTRS)),
            xattrs: self
                .xattrs
                .filter(|_| entry_mask.contains(EntryMask::INODE_XATTRS)),
        }
    }
}
