//! chained-hashmap: a single-threaded separate-chaining map with a hash
//! function fixed at construction and fail-fast cursors that can erase
//! mid-traversal.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a hash map whose iteration protocol detects structural change
//!   deterministically instead of yielding stale data, while still allowing
//!   the traversing cursor itself to remove entries.
//! - Layers:
//!   - `chain::Buckets<K, V>`: bucket array of singly linked chains stored
//!     in a slotmap arena; every chain ends in an explicit terminal node.
//!   - `ChainedHashMap<K, V, H>`: placement, insert/update/erase, growth,
//!     copy and equality over `Buckets`; owns the modification counter.
//!   - `Cursor`: bucket index + node key + fence; takes the map as an
//!     argument on every call and checks ownership and the fence first.
//!
//! Constraints
//! - Single-threaded: the map is `!Send`/`!Sync` (reentrancy guard marker).
//! - Keys are unique; `K: Eq` decides identity within a chain.
//! - Bins start at 1 (or the requested count) and only ever double.
//! - The modification counter moves on new keys, erases and clears, never
//!   on value updates, so updating through `put` or a cursor keeps every
//!   cursor valid.
//!
//! Hash function resolution
//! - The function may come from the `H: TypeHash<K>` type parameter and/or
//!   a constructor argument. Neither is an error, both must be the same
//!   function (by name), otherwise the one present is used. Placement is
//!   `hash(key).unsigned_abs() % bins`, so `i64::MIN` is safe.
//!
//! Removal without a predecessor
//! - Erasing the entry in node `n` moves `n`'s successor into `n` and frees
//!   the successor's arena slot. The terminal tail guarantees a successor.
//!   A cursor sitting on `n` therefore ends up on "the next entry" for free;
//!   only when `n` was its chain's last entry does the cursor move itself
//!   before the erase.
//!
//! Growth
//! - Checked only when a new key is linked: if `(len + 1) / bins` exceeds
//!   the load threshold (compared as `f64`), a fresh arena with twice the
//!   bins is built, every entry is moved into a new node, and the old arena
//!   is dropped whole.
//!
//! Notes and non-goals
//! - No ordered iteration, no thread-safety, no persistence.
//! - Cursors do not borrow the map; the borrow checker therefore does not
//!   stop foreign mutation, the fence does.

mod chain;
pub mod config;
pub mod cursor;
pub mod error;
pub mod hashing;
pub mod map;
mod map_proptest;
mod reentrancy;

// Public surface
pub use config::MapConfig;
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use hashing::{std_hash, HashFn, NoHash, StdHash, TypeHash};
pub use map::ChainedHashMap;
pub use reentrancy::DebugReentrancy;
