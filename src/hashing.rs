//! Hash-function plumbing: the function type, the type-level slot for it,
//! and construction-time resolution.
//!
//! A map may receive its hash function from two places: the `H` type
//! parameter (via [`TypeHash::HASH`]) and a constructor argument. `resolve`
//! picks the one that is actually present and rejects the ambiguous cases.
//!
//! Two hash functions are "the same" when their names are equal. Function
//! pointer addresses are not used: the compiler may merge functions with
//! identical bodies, or give one function several addresses.

use crate::error::{Error, Result};
use core::fmt;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Named hash function used for bucket placement.
///
/// The function is signed so that callers can port existing `int`-returning
/// hashes; placement normalises the sign. The name is the function's
/// identity. Build one with [`hash_fn!`](crate::hash_fn), which names the
/// function by its full path, or with [`HashFn::new`].
pub struct HashFn<K> {
    name: &'static str,
    func: fn(&K) -> i64,
}

impl<K> HashFn<K> {
    /// Distinct functions must be given distinct names.
    pub const fn new(name: &'static str, func: fn(&K) -> i64) -> Self {
        Self { name, func }
    }

    /// [`std_hash`] for `K`.
    pub const fn std() -> Self
    where
        K: Hash,
    {
        Self::new("chained_hashmap::std_hash", std_hash::<K>)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn hash(&self, key: &K) -> i64 {
        (self.func)(key)
    }
}

impl<K> Clone for HashFn<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for HashFn<K> {}

impl<K> PartialEq for HashFn<K> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<K> Eq for HashFn<K> {}

impl<K> fmt::Debug for HashFn<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HashFn").field(&self.name).finish()
    }
}

/// Wrap a function path in a [`HashFn`] named after its module path.
///
/// ```
/// use chained_hashmap::{hash_fn, HashFn};
///
/// fn by_len(s: &String) -> i64 {
///     s.len() as i64
/// }
///
/// let h: HashFn<String> = hash_fn!(by_len);
/// assert_eq!(h.hash(&"abc".to_string()), 3);
/// ```
#[macro_export]
macro_rules! hash_fn {
    ($f:expr) => {
        $crate::HashFn::new(
            concat!(module_path!(), "::", stringify!($f)),
            $f,
        )
    };
}

/// Type-level hash slot. `HASH = None` marks the "no hash" placeholder.
pub trait TypeHash<K> {
    const HASH: Option<HashFn<K>>;
}

/// Placeholder: the hash function must come from the constructor.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NoHash;

impl<K> TypeHash<K> for NoHash {
    const HASH: Option<HashFn<K>> = None;
}

/// Uses [`std_hash`] for any `K: Hash`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StdHash;

impl<K: Hash> TypeHash<K> for StdHash {
    const HASH: Option<HashFn<K>> = Some(HashFn::std());
}

/// Deterministic SipHash of `key` (fixed zero keys, stable within a build).
pub fn std_hash<K: Hash>(key: &K) -> i64 {
    let mut h = DefaultHasher::new();
    key.hash(&mut h);
    h.finish() as i64
}

/// Resolve the hash function for a map being built by `op`.
pub(crate) fn resolve<K, H: TypeHash<K>>(
    op: &'static str,
    ctor: Option<HashFn<K>>,
) -> Result<HashFn<K>> {
    match (H::HASH, ctor) {
        (None, None) => Err(Error::HashFunctionUnresolved { op }),
        (Some(t), Some(c)) if t != c => Err(Error::HashFunctionConflict { op }),
        (Some(t), _) => Ok(t),
        (None, Some(c)) => Ok(c),
    }
}

/// Map a hash into `[0, bins)`. `unsigned_abs` keeps `i64::MIN` in range.
#[inline]
pub(crate) fn compress(hash: i64, bins: usize) -> usize {
    debug_assert!(bins > 0);
    (hash.unsigned_abs() % bins as u64) as usize
}
