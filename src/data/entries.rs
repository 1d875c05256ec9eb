//! Export and import records produced by partitioning and overlap expansion.
//!
//! An [`ExportEntry`] says "send cell `global` to `rank`"; an [`ImportEntry`]
//! says "receive cell `global` from `rank`". Import entries also carry the
//! local index the cell gets on this process, which stays `None` until
//! [`assign_local_indices`](crate::algs::distribute::assign_local_indices)
//! runs.

use crate::topology::ownership::Attribute;

/// Global cell index: position of the cell in the undistributed grid.
pub type GlobalIndex = usize;
/// Process-local cell index, dense in `0..N`.
pub type LocalIndex = usize;

/// A cell this process must send.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ExportEntry {
    pub global: GlobalIndex,
    /// Destination rank.
    pub rank: usize,
    /// Attribute the cell has on the destination.
    pub attribute: Attribute,
}

impl ExportEntry {
    pub fn new(global: GlobalIndex, rank: usize, attribute: Attribute) -> Self {
        Self {
            global,
            rank,
            attribute,
        }
    }
}

/// A cell this process must receive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImportEntry {
    pub global: GlobalIndex,
    /// Source rank.
    pub rank: usize,
    /// Attribute the cell has on this process.
    pub attribute: Attribute,
    pub local: Option<LocalIndex>,
}

impl ImportEntry {
    /// New entry with no local index yet.
    pub fn new(global: GlobalIndex, rank: usize, attribute: Attribute) -> Self {
        Self {
            global,
            rank,
            attribute,
            local: None,
        }
    }
}

/// Records that name a peer rank; used by interface reservation.
pub trait RankedEntry {
    fn rank(&self) -> usize;
}

impl RankedEntry for ExportEntry {
    fn rank(&self) -> usize {
        self.rank
    }
}

impl RankedEntry for ImportEntry {
    fn rank(&self) -> usize {
        self.rank
    }
}
