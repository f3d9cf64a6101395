//! Stored entry documents.
//!
//! The store keeps one document per entry id. A document carries the
//! inode-level fields (statx, symlink target, inode xattrs) and the list of
//! namespace edges pointing at the entry; hard-linked entries simply have
//! several edges. Queries unwind the edge list, so a document without any
//! edge is unreachable until something links it.

use robinhood_core::bulk::EntryUpdate;
use robinhood_model::{FsEntry, Id, Statx, ValueMap};

/// A namespace edge: the entry is named `name` under `parent_id`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NsEdge {
    pub parent_id: Id,
    pub name: String,
    pub xattrs: ValueMap,
}

impl NsEdge {
    fn matches(&self, parent_id: &Id, name: &str) -> bool {
        self.parent_id == *parent_id && self.name == name
    }
}

/// One entry as stored.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Document {
    pub id: Id,
    pub ns: Vec<NsEdge>,
    pub statx: Option<Statx>,
    pub symlink: Option<String>,
    pub xattrs: ValueMap,
}

impl Document {
    pub(crate) fn new(id: Id) -> Self {
        Self {
            id,
            ns: Vec::new(),
            statx: None,
            symlink: None,
            xattrs: ValueMap::new(),
        }
    }

    /// Apply one update-one operation to this document.
    pub(crate) fn apply(&mut self, update: &EntryUpdate) {
        match update {
            EntryUpdate::Upsert {
                statx,
                symlink,
                xattrs,
            } => {
                if let Some(statx) = statx {
                    self.statx = Some(statx.clone());
                }
                if let Some(symlink) = symlink {
                    self.symlink = Some(symlink.clone());
                }
                self.xattrs
                    .extend(xattrs.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            EntryUpdate::SetInodeXattrs { xattrs } => {
                self.xattrs
                    .extend(xattrs.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            EntryUpdate::SetNamespaceXattrs {
                parent_id,
                name,
                xattrs,
            } => {
                for edge in &mut self.ns {
                    if edge.matches(parent_id, name) {
                        edge.xattrs
                            .extend(xattrs.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                }
            }
            EntryUpdate::AddNamespaceEdge { parent_id, name } => {
                if !self.ns.iter().any(|edge| edge.matches(parent_id, name)) {
                    self.ns.push(NsEdge {
                        parent_id: parent_id.clone(),
                        name: name.clone(),
                        xattrs: ValueMap::new(),
                    });
                }
            }
            EntryUpdate::PullNamespaceEdge { parent_id, name } => {
                self.ns.retain(|edge| !edge.matches(parent_id, name));
            }
        }
    }

    /// The unwound result row for the edge at `index`, with every field
    /// populated. Projection happens later, on the matching rows only.
    pub(crate) fn row(&self, index: usize) -> Option<FsEntry> {
        let edge: &NsEdge = self.ns.get(index)?;
        Some(FsEntry {
            id: self.id.clone(),
            parent_id: Some(edge.parent_id.clone()),
            name: Some(edge.name.clone()),
            statx: self.statx.clone(),
            symlink: self.symlink.clone(),
            ns_xattrs: Some(edge.xattrs.clone()),
            xattrs: Some(self.xattrs.clone()),
        })
    }

    /// The number of namespace edges (result rows) of this document.
    pub(crate) fn edge_count(&self) -> usize {
        self.ns.len()
    }
}
