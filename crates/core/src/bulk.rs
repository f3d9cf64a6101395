//! Lowering event streams into bulk store operations.
//!
//! `update` turns its whole event stream into one bulk round-trip against
//! the store. This module does the event-to-operation lowering, which is
//! identical for every backend; executing the resulting operations is the
//! backend's own business.
//!
//! The lowering rules:
//! - `delete` becomes a remove-one keyed on the id;
//! - `link` becomes an ordered, adjacent pair: pull the edge from any
//!   previous parent (idempotent), then upsert the edge on the target;
//! - `unlink` becomes a pull without upsert (a missing entry stays missing);
//! - `upsert` and the xattr events become update-ones with upsert semantics.
//!
//! Events are lowered in stream order. Within one bulk a backend may reorder
//! operations for throughput, except that each link pair must stay adjacent
//! and ordered.

use robinhood_model::{FsEvent, FsEventKind, Id, Statx, ValueMap};

use crate::error::Result;
use crate::itertools::Cursor;

/// The field changes of a single update-one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryUpdate {
    /// Set attributes on the inode: statx record, symlink target, and
    /// merged inode xattrs.
    Upsert {
        statx: Option<Statx>,
        symlink: Option<String>,
        xattrs: ValueMap,
    },
    /// Merge xattrs on the inode (every hardlink sees them).
    SetInodeXattrs { xattrs: ValueMap },
    /// Merge xattrs on one namespace edge.
    SetNamespaceXattrs {
        parent_id: Id,
        name: String,
        xattrs: ValueMap,
    },
    /// Add the namespace edge `{parent_id, name}` unless already present.
    AddNamespaceEdge { parent_id: Id, name: String },
    /// Remove the namespace edge `{parent_id, name}` if present.
    PullNamespaceEdge { parent_id: Id, name: String },
}

/// One operation of a bulk batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOp {
    /// Remove the entry with this id; removing an absent entry is a no-op.
    RemoveOne { id: Id },
    /// Update the entry with this id; with `upsert`, create it first when
    /// missing.
    UpdateOne {
        id: Id,
        update: EntryUpdate,
        upsert: bool,
    },
}

/// An ordered batch of store operations plus the number of events it was
/// lowered from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bulk {
    ops: Vec<BulkOp>,
    events: usize,
}

impl Bulk {
    /// Lower a whole event stream into one batch.
    ///
    /// Consumes the cursor; an exhausted (empty) stream yields an empty
    /// batch.
    ///
    /// # Errors
    /// Forwards any failure of the event cursor itself.
    pub fn from_events(events: &mut dyn Cursor<Item = FsEvent>) -> Result<Self> {
        let mut bulk: Bulk = Bulk::default();
        while let Some(event) = events.next()? {
            bulk.push(event);
        }
        Ok(bulk)
    }

    /// Lower one event into its operations, in stream order.
    pub fn push(&mut self, event: FsEvent) {
        let FsEvent { id, kind } = event;
        match kind {
            FsEventKind::Delete => self.ops.push(BulkOp::RemoveOne { id }),
            FsEventKind::Link { parent_id, name } => {
                // The pull rids the entry of any stale edge with the same
                // parent and name; it must precede the add and stay adjacent
                // to it.
                self.ops.push(BulkOp::UpdateOne {
                    id: id.clone(),
                    update: EntryUpdate::PullNamespaceEdge {
                        parent_id: parent_id.clone(),
                        name: name.clone(),
                    },
                    upsert: false,
                });
                self.ops.push(BulkOp::UpdateOne {
                    id,
                    update: EntryUpdate::AddNamespaceEdge { parent_id, name },
                    upsert: true,
                });
            }
            FsEventKind::Unlink { parent_id, name } => self.ops.push(BulkOp::UpdateOne {
                id,
                update: EntryUpdate::PullNamespaceEdge { parent_id, name },
                upsert: false,
            }),
            FsEventKind::Upsert {
                statx,
                symlink,
                xattrs,
            } => self.ops.push(BulkOp::UpdateOne {
                id,
                update: EntryUpdate::Upsert {
                    statx,
                    symlink,
                    xattrs,
                },
                upsert: true,
            }),
            FsEventKind::InodeXattrs { xattrs } => self.ops.push(BulkOp::UpdateOne {
                id,
                update: EntryUpdate::SetInodeXattrs { xattrs },
                upsert: true,
            }),
            FsEventKind::NamespaceXattrs {
                parent_id,
                name,
                xattrs,
            } => self.ops.push(BulkOp::UpdateOne {
                id,
                update: EntryUpdate::SetNamespaceXattrs {
                    parent_id,
                    name,
                    xattrs,
                },
                upsert: true,
            }),
        }
        self.events += 1;
    }

    /// The lowered operations, in order.
    pub fn ops(&self) -> &[BulkOp] {
        &self.ops
    }

    /// The number of events this batch was lowered from.
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// Whether the batch holds no operation at all.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
