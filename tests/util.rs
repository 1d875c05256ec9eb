#![allow(dead_code)]
use mesh_scatter::{
    algs::communicator::RayonComm,
    data::entries::{ExportEntry, ImportEntry},
    topology::ownership::Attribute,
};

pub fn exp(global: usize, rank: usize, attribute: Attribute) -> ExportEntry {
    ExportEntry::new(global, rank, attribute)
}

pub fn imp(global: usize, rank: usize, attribute: Attribute) -> ImportEntry {
    ImportEntry::new(global, rank, attribute)
}

/// Run `f` on every rank of an isolated in-process world, one thread each.
/// Results are returned by rank.
pub fn run_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(RayonComm) -> T + Sync,
{
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = RayonComm::world(size)
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank panicked"))
            .collect()
    })
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}
