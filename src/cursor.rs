//! Fail-fast cursor over a `ChainedHashMap`.
//!
//! A `Cursor` is a position (bucket index + node) plus a copy of the map's
//! modification counter taken when the cursor was created or last erased
//! through. It holds no borrow of the map: each operation receives the map
//! and first checks that the cursor was created from that very instance and
//! that no foreign structural change happened since.
//!
//! States:
//! - positioned: `pos` is `Some` and `can_erase` is true.
//! - post-erase: the cursor erased its entry and now sits on the entry that
//!   followed it; one `advance` is required (and absorbed) before the next
//!   dereference or erase.
//! - exhausted: `pos` is `None`.

use crate::chain::NodeKey;
use crate::error::{Error, Result};
use crate::map::ChainedHashMap;
use core::fmt;

#[derive(Clone, Debug)]
pub struct Cursor {
    owner: u64,
    pos: Option<(usize, NodeKey)>,
    expected_mod_count: u64,
    can_erase: bool,
}

impl Cursor {
    pub(crate) fn new<K, V, H>(
        map: &ChainedHashMap<K, V, H>,
        pos: Option<(usize, NodeKey)>,
    ) -> Self {
        Self {
            owner: map.id(),
            pos,
            expected_mod_count: map.mod_count(),
            can_erase: true,
        }
    }

    /// True once the cursor has run past the last entry.
    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    /// Bucket the cursor is in, if not exhausted.
    pub fn bin(&self) -> Option<usize> {
        self.pos.map(|(bin, _)| bin)
    }

    fn check_owner<K, V, H>(&self, op: &'static str, map: &ChainedHashMap<K, V, H>) -> Result<()> {
        if self.owner == map.id() {
            Ok(())
        } else {
            Err(Error::CrossInstanceIterator { op })
        }
    }

    fn check_fence<K, V, H>(&self, op: &'static str, map: &ChainedHashMap<K, V, H>) -> Result<()> {
        let found = map.mod_count();
        if self.expected_mod_count == found {
            Ok(())
        } else {
            Err(Error::ConcurrentModification {
                op,
                expected: self.expected_mod_count,
                found,
            })
        }
    }

    fn check<K, V, H>(&self, op: &'static str, map: &ChainedHashMap<K, V, H>) -> Result<()> {
        self.check_owner(op, map)?;
        self.check_fence(op, map)
    }

    /// Node under a dereferenceable cursor.
    fn positioned(&self, op: &'static str) -> Result<NodeKey> {
        if !self.can_erase {
            return Err(Error::IteratorMisuse {
                op,
                reason: "advance required after erase",
            });
        }
        match self.pos {
            Some((_, at)) => Ok(at),
            None => Err(Error::IteratorMisuse {
                op,
                reason: "cursor beyond the map",
            }),
        }
    }

    fn step<K, V, H>(&mut self, map: &ChainedHashMap<K, V, H>) {
        if let Some((bin, at)) = self.pos {
            self.pos = map.buckets().next_live(bin, at);
        }
    }

    /// Dereference: the entry under the cursor.
    pub fn get<'m, K, V, H>(&self, map: &'m ChainedHashMap<K, V, H>) -> Result<(&'m K, &'m V)> {
        const OP: &str = "Cursor::get";
        self.check(OP, map)?;
        let at = self.positioned(OP)?;
        map.buckets()
            .node(at)
            .and_then(|n| n.entry())
            .ok_or(Error::IteratorMisuse {
                op: OP,
                reason: "cursor does not reference an entry",
            })
    }

    /// Dereference for update. Changing the value is not a structural change.
    pub fn get_mut<'m, K, V, H>(
        &self,
        map: &'m mut ChainedHashMap<K, V, H>,
    ) -> Result<(&'m K, &'m mut V)> {
        const OP: &str = "Cursor::get_mut";
        self.check(OP, map)?;
        let at = self.positioned(OP)?;
        map.buckets_mut()
            .node_mut(at)
            .and_then(|n| n.entry_mut())
            .ok_or(Error::IteratorMisuse {
                op: OP,
                reason: "cursor does not reference an entry",
            })
    }

    /// Prefix increment. A no-op when exhausted; absorbed once after an erase.
    pub fn advance<K, V, H>(&mut self, map: &ChainedHashMap<K, V, H>) -> Result<()> {
        self.advance_as("Cursor::advance", map)
    }

    fn advance_as<K, V, H>(
        &mut self,
        op: &'static str,
        map: &ChainedHashMap<K, V, H>,
    ) -> Result<()> {
        self.check(op, map)?;
        if self.pos.is_none() {
            return Ok(());
        }
        if self.can_erase {
            self.step(map);
        } else {
            self.can_erase = true;
        }
        Ok(())
    }

    /// Postfix increment: advances and returns the cursor as it was before.
    pub fn post_advance<K, V, H>(&mut self, map: &ChainedHashMap<K, V, H>) -> Result<Cursor> {
        let before = self.clone();
        self.advance_as("Cursor::post_advance", map)?;
        Ok(before)
    }

    /// Remove the entry under the cursor from `map` and return it.
    ///
    /// If the entry was the last one in its chain the cursor moves on to the
    /// next entry first; otherwise the next entry of the chain takes the
    /// erased entry's place under the cursor. Either way the following
    /// `advance` is absorbed, and this cursor stays valid.
    pub fn erase<K, V, H>(&mut self, map: &mut ChainedHashMap<K, V, H>) -> Result<(K, V)> {
        const OP: &str = "Cursor::erase";
        self.check(OP, map)?;
        if !self.can_erase {
            return Err(Error::IteratorMisuse {
                op: OP,
                reason: "cursor already erased",
            });
        }
        let at = self.positioned(OP)?;
        let bin = self.bin();
        if map.buckets().is_last_live(at) {
            self.step(map);
        }
        let entry = map.remove_node(at).ok_or(Error::IteratorMisuse {
            op: OP,
            reason: "cursor does not reference an entry",
        })?;
        self.can_erase = false;
        self.expected_mod_count = map.mod_count();
        tracing::trace!(?bin, next_bin = ?self.bin(), "entry erased through cursor");
        Ok(entry)
    }

    /// Iterator equality: both cursors must come from `map` and be current.
    pub fn same_position<K, V, H>(
        &self,
        other: &Cursor,
        map: &ChainedHashMap<K, V, H>,
    ) -> Result<bool> {
        const OP: &str = "Cursor::same_position";
        if self.owner != other.owner {
            return Err(Error::CrossInstanceIterator { op: OP });
        }
        self.check(OP, map)?;
        other.check_fence(OP, map)?;
        Ok(self.pos.map(|(_, at)| at) == other.pos.map(|(_, at)| at))
    }

    /// Render the map's entries and the cursor's state.
    pub fn display<'a, K, V, H>(
        &'a self,
        map: &'a ChainedHashMap<K, V, H>,
    ) -> CursorDisplay<'a, K, V, H> {
        CursorDisplay { cursor: self, map }
    }
}

pub struct CursorDisplay<'a, K, V, H> {
    cursor: &'a Cursor,
    map: &'a ChainedHashMap<K, V, H>,
}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Display for CursorDisplay<'_, K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.cursor;
        write!(f, "{:?}", self.map)?;
        match c.pos {
            Some((bin, _)) => write!(f, "(bin={bin}")?,
            None => f.write_str("(end")?,
        }
        write!(
            f,
            ",expected_mod_count={},can_erase={})",
            c.expected_mod_count, c.can_erase
        )
    }
}
