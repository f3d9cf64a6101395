//! Lazy result cursors.
//!
//! `filter_entries` expands to the two-stage pipeline: unwind the namespace
//! edges so each entry is observed once per parent edge, then match the
//! filter against each row. Projection through the caller's masks comes
//! last, on the matching rows only.
//!
//! The cursor snapshots the set of document ids up front but reads the
//! documents themselves lazily, one `next` at a time; dropping it early
//! releases nothing more than the snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use robinhood_core::{Cursor, Result};
use robinhood_model::{EntryMask, Filter, FsEntry, Id, StatxMask};

use crate::filter::entry_matches;
use crate::Store;

pub(crate) struct MemoryCursor {
    store: Rc<RefCell<Store>>,
    ids: std::vec::IntoIter<Id>,
    /// Document currently being unwound, and the next edge to visit.
    position: Option<(Id, usize)>,
    filter: Filter,
    entry_mask: EntryMask,
    statx_mask: StatxMask,
}

impl MemoryCursor {
    pub(crate) fn new(
        store: Rc<RefCell<Store>>,
        filter: Filter,
        entry_mask: EntryMask,
        statx_mask: StatxMask,
    ) -> Self {
        let ids: Vec<Id> = store.borrow().documents.keys().cloned().collect();
        Self {
            store,
            ids: ids.into_iter(),
            position: None,
            filter,
            entry_mask,
            statx_mask,
        }
    }
}

impl Cursor for MemoryCursor {
    type Item = FsEntry;

    fn next(&mut self) -> Result<Option<FsEntry>> {
        loop {
            let (id, edge) = match self.position.take() {
                Some(position) => position,
                None => match self.ids.next() {
                    Some(id) => (id, 0),
                    None => return Ok(None),
                },
            };

            // A document may have vanished since the snapshot; skip it.
            let row: Option<FsEntry> = {
                let store = self.store.borrow();
                store
                    .documents
                    .get(&id)
                    .and_then(|document| document.row(edge))
            };
            let Some(row) = row else {
                continue;
            };

            self.position = Some((id, edge + 1));
            if entry_matches(&self.filter, &row)? {
                return Ok(Some(row.project(self.entry_mask, self.statx_mask)));
            }
        }
    }
}
