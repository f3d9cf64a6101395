//! Change events.
//!
//! Scanners emit a stream of `FsEvent`s describing how a filesystem drifted
//! from the mirrored state. Every event targets one entry id; backends fold
//! whole streams into their store in one bulk operation (see
//! `robinhood-core`'s bulk module).

use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::statx::Statx;
use crate::value::ValueMap;

/// What happened to the target entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FsEventKind {
    /// The entry was removed for good (its last link went away).
    Delete,
    /// A namespace edge `{parent_id, name}` now points at the entry.
    Link { parent_id: Id, name: String },
    /// The namespace edge `{parent_id, name}` no longer points at the entry.
    Unlink { parent_id: Id, name: String },
    /// The entry was created or its attributes changed.
    Upsert {
        statx: Option<Statx>,
        /// Symlink target; only meaningful for symbolic links.
        symlink: Option<String>,
        /// Inode xattrs to merge in.
        xattrs: ValueMap,
    },
    /// Inode xattrs changed; applies to every hardlink of the entry.
    InodeXattrs { xattrs: ValueMap },
    /// Namespace xattrs changed on one specific edge of the entry.
    NamespaceXattrs {
        parent_id: Id,
        name: String,
        xattrs: ValueMap,
    },
}

/// A single state change emitted by a scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsEvent {
    /// The id of the entry the event applies to.
    pub id: Id,
    pub kind: FsEventKind,
}

impl FsEvent {
    /// An upsert event: create the entry or update its attributes.
    pub fn upsert(
        id: Id,
        statx: Option<Statx>,
        symlink: Option<String>,
        xattrs: ValueMap,
    ) -> Self {
        Self {
            id,
            kind: FsEventKind::Upsert {
                statx,
                symlink,
                xattrs,
            },
        }
    }

    /// A link event: the entry gained the namespace edge `{parent_id, name}`.
    pub fn link(id: Id, parent_id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: FsEventKind::Link {
                parent_id,
                name: name.into(),
            },
        }
    }

    /// An unlink event: the entry lost the namespace edge `{parent_id, name}`.
    pub fn unlink(id: Id, parent_id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: FsEventKind::Unlink {
                parent_id,
                name: name.into(),
            },
        }
    }

    /// A delete event: the entry is gone.
    pub fn delete(id: Id) -> Self {
        Self {
            id,
            kind: FsEventKind::Delete,
        }
    }

    /// An inode-xattr event: `xattrs` is merged into the entry's inode
    /// xattrs, visible through every hardlink.
    pub fn inode_xattrs(id: Id, xattrs: ValueMap) -> Self {
        Self {
            id,
            kind: FsEventKind::InodeXattrs { xattrs },
        }
    }

    /// A namespace-xattr event: `xattrs` is merged into the xattrs of the
    /// single edge `{parent_id, name}` of the entry.
    pub fn namespace_xattrs(
        id: Id,
        parent_id: Id,
        name: impl Into<String>,
        xattrs: ValueMap,
    ) -> Self {
        Self {
            id,
            kind: FsEventKind::NamespaceXattrs {
                parent_id,
                name: name.into(),
                xattrs,
            },
        }
    }
}
