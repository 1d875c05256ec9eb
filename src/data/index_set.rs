//! Parallel index set: global cell index → (local index, attribute, public flag).
//!
//! The set is filled in bulk: open it with [`ParallelIndexSet::begin_resize`],
//! [`add`](ParallelIndexSet::add) one pair per cell, and close it with
//! [`end_resize`](ParallelIndexSet::end_resize), which sorts the pairs by
//! global index and rejects duplicates. Lookups are only meaningful on a
//! closed set.

use crate::data::entries::{GlobalIndex, LocalIndex};
use crate::debug_invariants::{DebugInvariants, check_dense_permutation};
use crate::mesh_error::MeshScatterError;
use crate::topology::ownership::Attribute;

/// Local side of an index pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ParallelLocalIndex {
    pub local: LocalIndex,
    pub attribute: Attribute,
    /// Whether the index takes part in communication.
    pub public: bool,
}

impl ParallelLocalIndex {
    pub fn new(local: LocalIndex, attribute: Attribute, public: bool) -> Self {
        Self {
            local,
            attribute,
            public,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IndexPair {
    pub global: GlobalIndex,
    pub local: ParallelLocalIndex,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParallelIndexSet {
    pairs: Vec<IndexPair>,
    resizing: bool,
}

impl ParallelIndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the set for bulk insertion.
    pub fn begin_resize(&mut self) -> Result<(), MeshScatterError> {
        if self.resizing {
            return Err(MeshScatterError::IndexSetAlreadyResizing);
        }
        self.resizing = true;
        Ok(())
    }

    /// Reserve room for `additional` pairs.
    pub fn reserve(&mut self, additional: usize) {
        self.pairs.reserve(additional);
    }

    /// Add one pair. Only valid between `begin_resize` and `end_resize`.
    pub fn add(
        &mut self,
        global: GlobalIndex,
        local: ParallelLocalIndex,
    ) -> Result<(), MeshScatterError> {
        if !self.resizing {
            return Err(MeshScatterError::IndexSetNotResizing);
        }
        self.pairs.push(IndexPair { global, local });
        Ok(())
    }

    /// Close bulk insertion: sort by global index and reject duplicates.
    pub fn end_resize(&mut self) -> Result<(), MeshScatterError> {
        if !self.resizing {
            return Err(MeshScatterError::IndexSetNotResizing);
        }
        self.resizing = false;
        self.pairs.sort_by_key(|p| p.global);
        if let Some(w) = self.pairs.windows(2).find(|w| w[0].global == w[1].global) {
            return Err(MeshScatterError::DuplicateGlobalIndex(w[0].global));
        }
        Ok(())
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Look up the local side of `global`.
    pub fn get(&self, global: GlobalIndex) -> Option<ParallelLocalIndex> {
        if self.resizing {
            return None;
        }
        self.pairs
            .binary_search_by_key(&global, |p| p.global)
            .ok()
            .map(|pos| self.pairs[pos].local)
    }

    pub fn contains(&self, global: GlobalIndex) -> bool {
        self.get(global).is_some()
    }

    /// Pairs in ascending global order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexPair> {
        self.pairs.iter()
    }

    /// Global index of every local index, i.e. the inverse map `local → global`.
    pub fn local_to_global(&self) -> Vec<GlobalIndex> {
        let mut out = vec![0; self.pairs.len()];
        for p in &self.pairs {
            if let Some(slot) = out.get_mut(p.local.local) {
                *slot = p.global;
            }
        }
        out
    }

    /// Global indices of cells owned by this process, ascending.
    pub fn owned_globals(&self) -> impl Iterator<Item = GlobalIndex> + '_ {
        self.pairs
            .iter()
            .filter(|p| p.local.attribute.is_owner())
            .map(|p| p.global)
    }

    /// Number of pairs carrying `attribute`.
    pub fn count_attribute(&self, attribute: Attribute) -> usize {
        self.pairs
            .iter()
            .filter(|p| p.local.attribute == attribute)
            .count()
    }
}

impl DebugInvariants for ParallelIndexSet {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ParallelIndexSet");
    }

    fn validate_invariants(&self) -> Result<(), MeshScatterError> {
        if self.resizing {
            return Err(MeshScatterError::IndexSetNotResizing);
        }
        if let Some(w) = self.pairs.windows(2).find(|w| w[0].global >= w[1].global) {
            return Err(MeshScatterError::DuplicateGlobalIndex(w[1].global));
        }
        check_dense_permutation(self.pairs.iter().map(|p| p.local.local), self.pairs.len())
    }
}
