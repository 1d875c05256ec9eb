mod util;
use util::*;

use mesh_scatter::algs::distribute::{
    LocalOrdering, assign_local_indices, build_distributed_index, setup_recv_interface,
    setup_send_interface,
};
use mesh_scatter::data::interface::{InterfaceMap, InterfaceSide};
use mesh_scatter::mesh_error::MeshScatterError;
use mesh_scatter::topology::ownership::Attribute;

#[test]
fn send_lists_count_distinct_cells() {
    let export = [exp(5, 1, Attribute::Owner), exp(5, 2, Attribute::Owner), exp(9, 2, Attribute::Owner)];
    let mut map = InterfaceMap::new();
    setup_send_interface(&export, &mut map);

    assert_eq!(map.send_list(1), &[0]);
    assert_eq!(map.send_list(2), &[0, 1]);
    assert!(map.recv_list(1).is_empty());
    assert_eq!(map.ranks().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn send_list_length_matches_export_count() {
    let export = [
        exp(0, 3, Attribute::Owner),
        exp(1, 0, Attribute::Owner),
        exp(1, 3, Attribute::Copy),
        exp(4, 3, Attribute::Owner),
        exp(6, 0, Attribute::Copy),
    ];
    let mut map = InterfaceMap::new();
    setup_send_interface(&export, &mut map);
    for rank in [0, 3] {
        let expected = export.iter().filter(|e| e.rank == rank).count();
        assert_eq!(map.send_list(rank).len(), expected);
        // pending reservation is applied when the entry is created
        assert!(map.get(rank).unwrap().side(InterfaceSide::Send).capacity() >= expected);
    }
    assert_eq!(map.send_list(3), &[0, 1, 2]);
    assert_eq!(map.send_list(0), &[1, 3]);
}

#[test]
fn global_order_numbering() {
    let mut import = vec![imp(5, 0, Attribute::Owner), imp(9, 0, Attribute::Owner), imp(3, 0, Attribute::Copy)];
    assign_local_indices(&mut import, 2, LocalOrdering::GlobalOrder);
    let got: Vec<_> = import.iter().map(|e| (e.global, e.local)).collect();
    assert_eq!(got, vec![(3, Some(0)), (5, Some(1)), (9, Some(2))]);

    let mut map = InterfaceMap::new();
    setup_recv_interface(&import, &mut map).unwrap();
    assert_eq!(map.recv_list(0), &[0, 1, 2]);
}

#[test]
fn owners_first_keeps_owned_cells_in_front() {
    let mut import = vec![
        imp(2, 0, Attribute::Owner),
        imp(8, 1, Attribute::Owner),
        imp(1, 0, Attribute::Copy),
        imp(5, 1, Attribute::Copy),
    ];
    let index = build_distributed_index(&[], &mut import, 2, LocalOrdering::OwnersFirst).unwrap();
    let set = &index.index_set;
    assert_eq!(set.get(2).unwrap().local, 0);
    assert_eq!(set.get(8).unwrap().local, 1);
    assert_eq!(set.get(1).unwrap().local, 2);
    assert_eq!(set.get(5).unwrap().local, 3);
    assert!(set.get(5).unwrap().public);
    assert_eq!(set.get(1).unwrap().attribute, Attribute::Copy);

    // receive lists follow the global order the senders use
    assert_eq!(index.interfaces.recv_list(0), &[2, 0]);
    assert_eq!(index.interfaces.recv_list(1), &[3, 1]);
}

#[test]
fn numbering_is_dense() {
    let mut import = vec![
        imp(10, 0, Attribute::Owner),
        imp(20, 0, Attribute::Owner),
        imp(30, 0, Attribute::Owner),
        imp(15, 1, Attribute::Copy),
        imp(25, 2, Attribute::Copy),
    ];
    let index = build_distributed_index(&[], &mut import, 3, LocalOrdering::GlobalOrder).unwrap();
    let locals: Vec<_> = index.index_set.iter().map(|p| p.local.local).collect();
    assert_permutation(&locals, &[0, 1, 2, 3, 4]);
    assert_eq!(index.index_set.local_to_global(), vec![10, 15, 20, 25, 30]);
}

#[test]
fn duplicate_global_index_is_fatal() {
    let mut import = vec![imp(7, 0, Attribute::Owner), imp(7, 0, Attribute::Copy)];
    assert_eq!(
        build_distributed_index(&[], &mut import, 1, LocalOrdering::GlobalOrder),
        Err(MeshScatterError::DuplicateGlobalIndex(7))
    );
}

#[test]
fn reservation_alone_creates_no_entry() {
    let import = [imp(1, 4, Attribute::Owner)];
    let mut map = InterfaceMap::new();
    mesh_scatter::algs::distribute::reserve_interface(&import, &mut map, InterfaceSide::Receive);
    assert!(map.get(4).is_none());
    assert_eq!(map.pending_reservation(4, InterfaceSide::Receive), Some(1));

    map.add(4, InterfaceSide::Receive, 0);
    assert_eq!(map.pending_reservation(4, InterfaceSide::Receive), None);
    assert_eq!(map.recv_list(4), &[0]);
}
