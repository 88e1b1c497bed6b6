use std::fmt;

use bytes::Bytes;

/// Opaque node identifier supplied by the caller at insertion time.
///
/// The library never generates identifiers; uniqueness within one structure
/// instance is the caller's responsibility, with reuse governed by
/// [`DuplicatePolicy`]. Identifiers are arbitrary non-empty byte sequences
/// and are cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeId(Bytes);

impl NodeId {
    /// Wraps raw identifier bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the identifier holds no bytes. Empty identifiers are rejected
    /// at insertion.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(Bytes::from(value.into_bytes()))
    }
}

impl From<&[u8]> for NodeId {
    fn from(value: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for NodeId {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", hex::encode(&self.0))
    }
}

/// Policy applied when an insert reuses an identifier already present in the
/// node table.
///
/// `Reject` surfaces the reuse as [`crate::StoreError::DuplicateId`] before
/// any state is touched. `Overwrite` replaces the stored record while
/// structural pointers to it stay in place; callers that manage identifier
/// lifecycles themselves own the repair of any stale pointers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail the insert when the identifier already exists (default).
    #[default]
    Reject,
    /// Replace the stored record, leaving existing pointers untouched.
    Overwrite,
}
