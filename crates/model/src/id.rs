//! Opaque entry identifiers.

use serde::{Deserialize, Serialize};

/// The identifier of a filesystem entry.
///
/// Backends treat ids as opaque byte blobs: they are handed out by scanners,
/// stored verbatim, and compared byte-for-byte. The empty id is reserved for
/// the root: the root entry is the unique entry whose parent id is empty.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id(Vec<u8>);

impl Id {
    /// Create an id from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    /// The root id (zero-length blob).
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Check whether this is the root id.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw bytes of the id.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The length of the id in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the id is empty (equivalent to `is_root`).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl From<&[u8]> for Id {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

impl From<Vec<u8>> for Id {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}
