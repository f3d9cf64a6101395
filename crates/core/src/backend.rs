//! The backend interface.
//!
//! A backend mirrors one filesystem into one store. The trait is the whole
//! contract: absorb change events (`update`), answer structured queries
//! (`filter_entries`), and hand out the root entry. Resource release is
//! `Drop`; dropping a backend invalidates every cursor derived from it, and
//! well-behaved implementations fail such cursors instead of misbehaving.
//!
//! Backend handles are not reentrant: callers drive one operation at a time
//! per handle, and cursors are single-consumer.

use robinhood_model::{ComparisonOperator, EntryMask, Field, Filter, FsEntry, FsEvent, StatxMask};

use crate::error::{Error, Result};
use crate::itertools::Cursor;

/// A lazy stream of query results. Dropping it releases the underlying
/// store cursor, even when it was only partially iterated.
pub type EntryCursor = Box<dyn Cursor<Item = FsEntry>>;

/// A mirror of one filesystem in one store.
pub trait Backend {
    /// The backend's type name (the URI scheme it registers under).
    fn name(&self) -> &str;

    /// Apply a stream of change events as a single best-effort batch.
    ///
    /// The entire cursor is consumed; it remains owned by the caller. On
    /// success, returns the number of events absorbed. An empty stream is a
    /// no-op returning 0.
    ///
    /// # Errors
    /// - `retry-later`: transient store condition, resubmit the same batch;
    /// - `out-of-memory`: the batch could not be built;
    /// - `backend-error`: any other driver failure, message included.
    fn update(&self, events: &mut dyn Cursor<Item = FsEvent>) -> Result<usize>;

    /// Stream every entry matching `filter`, one result row per namespace
    /// edge, with fields restricted to the given masks.
    ///
    /// The filter is validated before translation; `Filter::Null` matches
    /// every entry.
    fn filter_entries(
        &self,
        filter: &Filter,
        entry_mask: EntryMask,
        statx_mask: StatxMask,
    ) -> Result<EntryCursor>;

    /// The root entry: the unique entry whose parent id is empty.
    ///
    /// # Errors
    /// `no-such-entry` if the store holds no root.
    fn root(&self, entry_mask: EntryMask, statx_mask: StatxMask) -> Result<FsEntry> {
        let filter: Filter = Filter::compare_binary(
            ComparisonOperator::Equal,
            Field::ParentId,
            Vec::new(),
        )?;
        self.filter_one(&filter, entry_mask, statx_mask)
    }

    /// Retrieve a single entry matching `filter`.
    ///
    /// Pulls the first result and drops the cursor.
    ///
    /// # Errors
    /// `no-such-entry` if nothing matches.
    fn filter_one(
        &self,
        filter: &Filter,
        entry_mask: EntryMask,
        statx_mask: StatxMask,
    ) -> Result<FsEntry> {
        let mut entries: EntryCursor = self.filter_entries(filter, entry_mask, statx_mask)?;
        entries.next()?.ok_or(Error::NoSuchEntry)
    }
}

/// Instantiates backends of one type from URI-derived configuration.
///
/// Factories are registered in the process-wide registry (see the
/// `registry` module) under their scheme, either at startup for built-ins
/// or on first use for plugin-loaded backends.
pub trait BackendFactory: Send + Sync {
    /// The URI scheme this factory serves.
    fn scheme(&self) -> &str;

    /// Create a backend for the named filesystem mirror.
    fn create(&self, fsname: &str) -> Result<Box<dyn Backend>>;
}
