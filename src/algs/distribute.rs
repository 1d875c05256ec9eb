//! Local numbering, parallel index set and interface construction.
//!
//! Everything here is purely local: each process works on its own export and
//! import lists and never talks to its peers. Consistency across processes
//! comes from the lists themselves. The export list on the sender and the
//! import list on the receiver are both derived from the same partition, so
//! both sides agree on how many cells travel between each pair of ranks and
//! in which (global index) order.
//!
//! Phases must run in this order:
//! 1. [`assign_local_indices`] numbers every imported cell `0..N`;
//! 2. [`populate_index_set`] records `global → (local, attribute)`;
//! 3. [`setup_send_interface`] / [`setup_recv_interface`] build the
//!    per-neighbor message layouts.

use crate::data::entries::{ExportEntry, GlobalIndex, ImportEntry, RankedEntry};
use crate::data::index_set::{ParallelIndexSet, ParallelLocalIndex};
use crate::data::interface::{InterfaceMap, InterfaceSide};
use crate::mesh_error::MeshScatterError;
use itertools::Itertools;

/// Order in which local indices are handed out.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LocalOrdering {
    /// Owned and overlap cells interleaved in ascending global order.
    #[default]
    GlobalOrder,
    /// All owned cells (ascending global index) before all overlap cells
    /// (ascending global index).
    OwnersFirst,
}

/// Count entries per peer rank and reserve that much room on `side`.
///
/// No interface entry is created here; see [`InterfaceMap::reserve`].
pub fn reserve_interface<T: RankedEntry>(
    list: &[T],
    interface: &mut InterfaceMap,
    side: InterfaceSide,
) {
    for (rank, count) in list.iter().map(RankedEntry::rank).counts() {
        interface.reserve(rank, side, count);
    }
}

/// Build the send side of `interface` from an export list sorted by global index.
///
/// The sender's local index of a cell is its position among the *distinct*
/// exported global indices, so a cell sent to several ranks gets the same
/// index in every one of those send lists.
pub fn setup_send_interface(list: &[ExportEntry], interface: &mut InterfaceMap) {
    reserve_interface(list, interface, InterfaceSide::Send);
    let mut cell_index = 0usize;
    let mut previous: Option<GlobalIndex> = None;
    for entry in list {
        debug_assert!(
            previous.is_none_or(|p| entry.global >= p),
            "export list must be sorted by global index ({} after {:?})",
            entry.global,
            previous
        );
        if previous != Some(entry.global) {
            if previous.is_some() {
                cell_index += 1;
            }
            previous = Some(entry.global);
        }
        interface.add(entry.rank, InterfaceSide::Send, cell_index);
    }
}

/// Build the receive side of `interface` from a numbered import list.
///
/// Receive lists follow the order of `list`. Fails without touching
/// `interface` if any entry has no local index yet.
pub fn setup_recv_interface(
    list: &[ImportEntry],
    interface: &mut InterfaceMap,
) -> Result<(), MeshScatterError> {
    if let Some(entry) = list.iter().find(|e| e.local.is_none()) {
        return Err(MeshScatterError::UnassignedLocalIndex {
            global: entry.global,
        });
    }
    reserve_interface(list, interface, InterfaceSide::Receive);
    for entry in list {
        if let Some(local) = entry.local {
            interface.add(entry.rank, InterfaceSide::Receive, local);
        }
    }
    Ok(())
}

/// Stable merge of `list[..mid]` and `list[mid..]`, comparing global indices only.
fn merge_by_global(list: &mut Vec<ImportEntry>, mid: usize) {
    let tail = list.split_off(mid);
    let head = std::mem::take(list);
    *list = head
        .into_iter()
        .merge_by(tail, |a, b| a.global <= b.global)
        .collect();
}

/// Assign dense local indices `0..list.len()` to an import list.
///
/// `list[..num_imported_owner]` holds the owned cells and the rest the overlap
/// cells, each part sorted by global index. With
/// [`LocalOrdering::GlobalOrder`] the two parts are merged first and numbered
/// in merged order. With [`LocalOrdering::OwnersFirst`] they are numbered in
/// the given order and merged afterwards. Either way `list` ends up sorted by
/// global index, which is the order receive interfaces are built in.
pub fn assign_local_indices(
    list: &mut Vec<ImportEntry>,
    num_imported_owner: usize,
    ordering: LocalOrdering,
) {
    debug_assert!(num_imported_owner <= list.len());
    let mid = num_imported_owner.min(list.len());
    debug_assert!(
        list[..mid].is_sorted_by_key(|e| e.global) && list[mid..].is_sorted_by_key(|e| e.global),
        "owner and overlap parts of the import list must each be sorted by global index"
    );

    if ordering == LocalOrdering::GlobalOrder {
        merge_by_global(list, mid);
    }
    for (local, entry) in list.iter_mut().enumerate() {
        entry.local = Some(local);
    }
    if ordering == LocalOrdering::OwnersFirst {
        merge_by_global(list, mid);
    }
}

/// Fill `index_set` with one public pair per numbered import entry.
pub fn populate_index_set(
    list: &[ImportEntry],
    index_set: &mut ParallelIndexSet,
) -> Result<(), MeshScatterError> {
    index_set.begin_resize()?;
    index_set.reserve(list.len());
    for entry in list {
        let local = entry
            .local
            .ok_or(MeshScatterError::UnassignedLocalIndex {
                global: entry.global,
            })?;
        index_set.add(
            entry.global,
            ParallelLocalIndex::new(local, entry.attribute, true),
        )?;
    }
    index_set.end_resize()
}

/// Index set and interfaces of one distribution event.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DistributedIndex {
    pub index_set: ParallelIndexSet,
    pub interfaces: InterfaceMap,
}

/// Run all local phases on freshly expanded lists.
///
/// `import` is numbered in place; `export` must be sorted by global index.
pub fn build_distributed_index(
    export: &[ExportEntry],
    import: &mut Vec<ImportEntry>,
    num_imported_owner: usize,
    ordering: LocalOrdering,
) -> Result<DistributedIndex, MeshScatterError> {
    assign_local_indices(import, num_imported_owner, ordering);

    let mut index_set = ParallelIndexSet::new();
    populate_index_set(import, &mut index_set)?;

    let mut interfaces = InterfaceMap::new();
    setup_send_interface(export, &mut interfaces);
    setup_recv_interface(import, &mut interfaces)?;

    log::debug!(
        "built index set with {} cells and interfaces to {} ranks",
        index_set.len(),
        interfaces.len()
    );
    Ok(DistributedIndex {
        index_set,
        interfaces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::ownership::Attribute;

    fn exp(g: usize, r: usize) -> ExportEntry {
        ExportEntry::new(g, r, Attribute::Owner)
    }

    fn imp(g: usize, r: usize, a: Attribute) -> ImportEntry {
        ImportEntry::new(g, r, a)
    }

    #[test]
    fn reservation_counts_per_rank() {
        let list = vec![exp(1, 2), exp(2, 2), exp(3, 0)];
        let mut map = InterfaceMap::new();
        reserve_interface(&list, &mut map, InterfaceSide::Send);
        assert_eq!(map.pending_reservation(2, InterfaceSide::Send), Some(2));
        assert_eq!(map.pending_reservation(0, InterfaceSide::Send), Some(1));
        assert_eq!(map.pending_reservation(1, InterfaceSide::Send), None);
        assert!(map.is_empty());
    }

    #[test]
    fn owners_first_numbers_owners_before_overlap() {
        let mut list = vec![
            imp(5, 0, Attribute::Owner),
            imp(9, 0, Attribute::Owner),
            imp(3, 0, Attribute::Copy),
        ];
        assign_local_indices(&mut list, 2, LocalOrdering::OwnersFirst);
        let got: Vec<_> = list.iter().map(|e| (e.global, e.local.unwrap())).collect();
        assert_eq!(got, vec![(3, 2), (5, 0), (9, 1)]);
    }

    #[test]
    fn merge_keeps_owner_before_overlap_on_ties() {
        let mut list = vec![imp(4, 0, Attribute::Owner), imp(4, 1, Attribute::Copy)];
        assign_local_indices(&mut list, 1, LocalOrdering::GlobalOrder);
        assert_eq!(list[0].attribute, Attribute::Owner);
        assert_eq!(list[1].attribute, Attribute::Copy);
    }

    #[test]
    fn recv_interface_rejects_unnumbered_entries() {
        let list = vec![imp(1, 0, Attribute::Owner)];
        let mut map = InterfaceMap::new();
        assert_eq!(
            setup_recv_interface(&list, &mut map),
            Err(MeshScatterError::UnassignedLocalIndex { global: 1 })
        );
        assert!(map.is_empty());
        assert_eq!(map.pending_reservation(0, InterfaceSide::Receive), None);
    }

    #[test]
    fn duplicate_import_is_a_consistency_error() {
        let mut list = vec![imp(2, 0, Attribute::Owner), imp(2, 1, Attribute::Copy)];
        let err = build_distributed_index(&[], &mut list, 1, LocalOrdering::GlobalOrder);
        assert_eq!(err, Err(MeshScatterError::DuplicateGlobalIndex(2)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "sorted by global index")]
    fn unsorted_export_list_panics_in_debug() {
        let mut map = InterfaceMap::new();
        setup_send_interface(&[exp(9, 1), exp(5, 1)], &mut map);
    }
}
