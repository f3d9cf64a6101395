//! Data model for filesystem metadata mirrors.
//!
//! This crate defines the types shared by every RobinHood backend:
//! - `Id` - opaque binary entry identifiers (the empty id is the root)
//! - `Statx` - extended stat records with a field mask
//! - `Value` - the tagged values filters compare fields against
//! - `Filter` - the immutable predicate AST with its validator
//! - `FsEntry` - a filesystem entry as returned by queries
//! - `FsEvent` - a single state change emitted by a scanner
//!
//! Backends translate `Filter` trees into their native query dialect and
//! absorb `FsEvent` streams into their store; see the `robinhood-core`
//! crate for the backend interface itself.

pub mod error;
pub mod filter;
pub mod fsentry;
pub mod fsevent;
pub mod id;
pub mod statx;
pub mod value;

pub use error::FilterError;
pub use filter::{Comparison, ComparisonOperator, Field, Filter, LogicalOperator};
pub use fsentry::{EntryMask, FsEntry};
pub use fsevent::{FsEvent, FsEventKind};
pub use id::Id;
pub use statx::{Statx, StatxMask, StatxTimestamp};
pub use value::{RegexOptions, Value, ValueMap};
