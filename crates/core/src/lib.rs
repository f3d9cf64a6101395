//! Backend abstraction for filesystem metadata mirrors.
//!
//! Scanners stream change events into a store; client tools query the store
//! with structured predicates. This crate is the hinge between the two:
//!
//! - `error` - the error kinds every backend reports
//! - `uri` - RFC 3986 parsing of backend addresses
//! - `itertools` - the `Cursor` trait and its combinators (array, chunkify,
//!   tee)
//! - `backend` - the four-operation backend trait, `filter_one`, factories
//! - `bulk` - lowering event streams into bulk store operations
//! - `registry` - scheme-to-factory resolution, `backend_from_uri`
//! - `plugin` - dynamic loading of `librbh-<scheme>.so` backends (behind
//!   the `dynamic-plugins` feature)
//!
//! The concurrency model is single-threaded and cooperative: nothing here
//! spawns threads, every cursor handle has one consumer, and blocking only
//! happens inside `next` calls and backend operations.

pub mod backend;
pub mod bulk;
pub mod error;
pub mod itertools;
#[cfg(feature = "dynamic-plugins")]
pub mod plugin;
pub mod registry;
pub mod uri;

pub use backend::{Backend, BackendFactory, EntryCursor};
pub use bulk::{Bulk, BulkOp, EntryUpdate};
pub use error::{Error, Result};
pub use itertools::{
    chunkify, tee, tee_with_capacity, ArrayCursor, Chunk, Chunkify, Cursor, SliceCursor, Tee,
};
pub use registry::{backend_from_uri, register_backend};
pub use uri::{Authority, RawUri, RBH_SCHEME};
