//! The in-memory reference backend.
//!
//! A document store living entirely in process memory, implementing the
//! full backend contract: bulk event ingestion, namespace unwinding,
//! reference filter semantics, and mask-driven projection. It exists so the
//! rest of the stack (registry, bulk protocol, query pipeline) can be
//! exercised and tested without a database; it is also the executable
//! specification other backends are compared against.
//!
//! ```
//! use robinhood_core::{backend_from_uri, ArrayCursor};
//! use robinhood_model::{EntryMask, FsEvent, Id, StatxMask};
//!
//! robinhood_memory::register();
//! let backend = backend_from_uri("memory:example").unwrap();
//!
//! let events = vec![
//!     FsEvent::upsert(Id::new(*b"r"), None, None, Default::default()),
//!     FsEvent::link(Id::new(*b"r"), Id::root(), ""),
//! ];
//! assert_eq!(backend.update(&mut ArrayCursor::new(events)).unwrap(), 2);
//!
//! let root = backend.root(EntryMask::ID, StatxMask::empty()).unwrap();
//! assert_eq!(root.id, Id::new(*b"r"));
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use robinhood_core::bulk::{Bulk, BulkOp};
use robinhood_core::{Backend, BackendFactory, Cursor, EntryCursor, Result};
use robinhood_model::{EntryMask, Filter, FsEvent, Id, StatxMask};

mod document;
mod filter;
mod query;

use document::Document;
use query::MemoryCursor;

/// The URI scheme of the in-memory backend.
pub const SCHEME: &str = "memory";

pub(crate) struct Store {
    pub(crate) documents: BTreeMap<Id, Document>,
}

impl Store {
    fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
        }
    }

    fn apply(&mut self, op: &BulkOp) {
        match op {
            BulkOp::RemoveOne { id } => {
                self.documents.remove(id);
            }
            BulkOp::UpdateOne { id, update, upsert } => {
                match self.documents.get_mut(id) {
                    Some(document) => document.apply(update),
                    None if *upsert => {
                        let mut document: Document = Document::new(id.clone());
                        document.apply(update);
                        self.documents.insert(id.clone(), document);
                    }
                    // Without upsert, a missing entry stays missing.
                    None => {}
                }
            }
        }
    }
}

/// An in-memory mirror of one filesystem.
pub struct MemoryBackend {
    fsname: String,
    store: Rc<RefCell<Store>>,
}

impl MemoryBackend {
    /// Create an empty mirror named `fsname`.
    pub fn new(fsname: impl Into<String>) -> Self {
        Self {
            fsname: fsname.into(),
            store: Rc::new(RefCell::new(Store::new())),
        }
    }

    /// The name of the mirrored filesystem.
    pub fn fsname(&self) -> &str {
        &self.fsname
    }

    /// The number of entries currently stored.
    pub fn entry_count(&self) -> usize {
        self.store.borrow().documents.len()
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        SCHEME
    }

    fn update(&self, events: &mut dyn Cursor<Item = FsEvent>) -> Result<usize> {
        let bulk: Bulk = Bulk::from_events(events)?;
        if bulk.is_empty() {
            return Ok(0);
        }

        let mut store = self.store.borrow_mut();
        for op in bulk.ops() {
            store.apply(op);
        }

        debug!(
            fsname = %self.fsname,
            events = bulk.event_count(),
            ops = bulk.ops().len(),
            "applied bulk update"
        );
        Ok(bulk.event_count())
    }

    fn filter_entries(
        &self,
        filter: &Filter,
        entry_mask: EntryMask,
        statx_mask: StatxMask,
    ) -> Result<EntryCursor> {
        filter.validate()?;
        trace!(fsname = %self.fsname, ?entry_mask, ?statx_mask, "starting filtered query");

        Ok(Box::new(MemoryCursor::new(
            Rc::clone(&self.store),
            filter.clone(),
            entry_mask,
            statx_mask,
        )))
    }
}

/// Factory for [`MemoryBackend`]s, served under the `memory` scheme.
pub struct MemoryBackendFactory;

impl BackendFactory for MemoryBackendFactory {
    fn scheme(&self) -> &str {
        SCHEME
    }

    fn create(&self, fsname: &str) -> Result<Box<dyn Backend>> {
        Ok(Box::new(MemoryBackend::new(fsname)))
    }
}

/// Register the `memory` scheme in the process-wide registry.
///
/// Idempotent; call it once at startup before resolving `memory:` URIs.
pub fn register() {
    robinhood_core::register_backend(Arc::new(MemoryBackendFactory));
}
