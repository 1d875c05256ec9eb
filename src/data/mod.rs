//! Data module: exchange records, parallel index set and interfaces.

pub mod entries;
pub mod index_set;
pub mod interface;

pub use entries::{ExportEntry, GlobalIndex, ImportEntry, LocalIndex};
pub use index_set::ParallelIndexSet;
pub use interface::{InterfaceMap, InterfaceSide};
