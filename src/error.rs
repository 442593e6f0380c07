//! Failure kinds surfaced by `ChainedHashMap` and its cursors.
//!
//! Every variant is a contract violation by the caller. Nothing is retried;
//! a failed operation leaves the table as it was.

/// Errors returned by map construction, key removal and cursor operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Neither the type parameter nor the constructor supplied a hash function.
    #[error("{op}: no hash function specified")]
    HashFunctionUnresolved {
        /// Constructor that failed.
        op: &'static str,
    },
    /// The type parameter and the constructor supplied different hash functions.
    #[error("{op}: type and constructor hash functions differ")]
    HashFunctionConflict {
        /// Constructor that failed.
        op: &'static str,
    },
    /// The key is not present.
    #[error("{op}: key({key}) not in map")]
    KeyNotFound {
        /// Operation that failed.
        op: &'static str,
        /// Debug rendering of the missing key.
        key: String,
    },
    /// The map changed structurally since the cursor last synchronised.
    #[error("{op}: map modified during iteration (expected mod_count {expected}, found {found})")]
    ConcurrentModification {
        /// Cursor operation that failed.
        op: &'static str,
        /// Fence recorded by the cursor.
        expected: u64,
        /// Current modification count of the map.
        found: u64,
    },
    /// The cursor is exhausted or has not been advanced since its last erase.
    #[error("{op}: illegal iterator position ({reason})")]
    IteratorMisuse {
        /// Cursor operation that failed.
        op: &'static str,
        /// Which illegal state the cursor was in.
        reason: &'static str,
    },
    /// The cursors (or cursor and map) belong to different map instances.
    #[error("{op}: iterators over different maps")]
    CrossInstanceIterator {
        /// Cursor operation that failed.
        op: &'static str,
    },
    /// A configuration value is out of range.
    #[error("invalid value for {key}: {value}")]
    InvalidConfig {
        /// Configuration field.
        key: &'static str,
        /// Rendered offending value.
        value: String,
    },
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn key_not_found<K: core::fmt::Debug>(op: &'static str, key: &K) -> Self {
        Error::KeyNotFound {
            op,
            key: format!("{:?}", key),
        }
    }
}
