//! Per-neighbor communication interfaces.
//!
//! An [`InterfaceMap`] maps a peer rank to an [`InterfaceEntry`] holding two
//! lists of local indices: the cells to send to that peer and the cells to
//! receive from it, both in message order. The forward direction of the
//! interface scatters data from the root view into the distributed view, the
//! backward direction gathers it back.
//!
//! Capacity reserved for a rank that has no entry yet is remembered and
//! applied when the first index for that rank is added, so a reservation
//! never creates an entry on its own.

use crate::data::entries::LocalIndex;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Which list of an [`InterfaceEntry`] an operation targets.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum InterfaceSide {
    Send,
    Receive,
}

/// Ordered list of local indices exchanged with one peer in one direction.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InterfaceInformation {
    indices: Vec<LocalIndex>,
}

impl InterfaceInformation {
    pub fn reserve(&mut self, additional: usize) {
        self.indices.reserve(additional);
    }

    pub fn add(&mut self, local: LocalIndex) {
        self.indices.push(local);
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.indices.capacity()
    }

    pub fn as_slice(&self) -> &[LocalIndex] {
        &self.indices
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InterfaceEntry {
    pub send: InterfaceInformation,
    pub recv: InterfaceInformation,
}

impl InterfaceEntry {
    pub fn side(&self, side: InterfaceSide) -> &InterfaceInformation {
        match side {
            InterfaceSide::Send => &self.send,
            InterfaceSide::Receive => &self.recv,
        }
    }

    pub fn side_mut(&mut self, side: InterfaceSide) -> &mut InterfaceInformation {
        match side {
            InterfaceSide::Send => &mut self.send,
            InterfaceSide::Receive => &mut self.recv,
        }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct InterfaceMap {
    entries: BTreeMap<usize, InterfaceEntry>,
    #[serde(skip)]
    pending: BTreeMap<(usize, InterfaceSide), usize>,
}

/// Two maps are equal when their entries are; outstanding reservations are
/// a capacity hint only.
impl PartialEq for InterfaceMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for InterfaceMap {}

impl InterfaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `count` slots on `side` for `rank`.
    pub fn reserve(&mut self, rank: usize, side: InterfaceSide, count: usize) {
        match self.entries.get_mut(&rank) {
            Some(entry) => entry.side_mut(side).reserve(count),
            None => *self.pending.entry((rank, side)).or_insert(0) += count,
        }
    }

    /// Append `local` to the `side` list of `rank`, creating the entry on first use.
    pub fn add(&mut self, rank: usize, side: InterfaceSide, local: LocalIndex) {
        let entry = match self.entries.entry(rank) {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => {
                let mut fresh = InterfaceEntry::default();
                for s in [InterfaceSide::Send, InterfaceSide::Receive] {
                    if let Some(n) = self.pending.remove(&(rank, s)) {
                        fresh.side_mut(s).reserve(n);
                    }
                }
                v.insert(fresh)
            }
        };
        entry.side_mut(side).add(local);
    }

    /// Capacity recorded for a rank that has no entry yet.
    pub fn pending_reservation(&self, rank: usize, side: InterfaceSide) -> Option<usize> {
        self.pending.get(&(rank, side)).copied()
    }

    pub fn get(&self, rank: usize) -> Option<&InterfaceEntry> {
        self.entries.get(&rank)
    }

    /// Send list for `rank` (empty if the rank has no entry).
    pub fn send_list(&self, rank: usize) -> &[LocalIndex] {
        self.entries.get(&rank).map(|e| e.send.as_slice()).unwrap_or(&[])
    }

    /// Receive list for `rank` (empty if the rank has no entry).
    pub fn recv_list(&self, rank: usize) -> &[LocalIndex] {
        self.entries.get(&rank).map(|e| e.recv.as_slice()).unwrap_or(&[])
    }

    /// Peer ranks with an entry, ascending.
    pub fn ranks(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &InterfaceEntry)> {
        self.entries.iter().map(|(&r, e)| (r, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_does_not_create_entries() {
        let mut map = InterfaceMap::new();
        map.reserve(3, InterfaceSide::Send, 4);
        assert!(map.is_empty());
        assert_eq!(map.pending_reservation(3, InterfaceSide::Send), Some(4));

        map.add(3, InterfaceSide::Send, 7);
        assert_eq!(map.pending_reservation(3, InterfaceSide::Send), None);
        let entry = map.get(3).unwrap();
        assert!(entry.send.capacity() >= 4);
        assert_eq!(entry.send.as_slice(), &[7]);
        assert!(entry.recv.is_empty());
    }

    #[test]
    fn pending_receive_applied_when_send_creates_entry() {
        let mut map = InterfaceMap::new();
        map.reserve(1, InterfaceSide::Receive, 8);
        map.add(1, InterfaceSide::Send, 0);
        assert!(map.get(1).unwrap().recv.capacity() >= 8);
        map.reserve(1, InterfaceSide::Receive, 2);
        assert_eq!(map.pending_reservation(1, InterfaceSide::Receive), None);
    }

    #[test]
    fn missing_rank_lists_are_empty() {
        let map = InterfaceMap::new();
        assert!(map.send_list(5).is_empty());
        assert!(map.recv_list(5).is_empty());
        assert_eq!(map.ranks().count(), 0);
    }
}
