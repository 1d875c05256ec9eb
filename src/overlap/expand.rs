//! Halo expansion of owner export/import lists.
//!
//! A cell is in the halo of rank `R` if it is not owned by `R` and can be
//! reached from a cell owned by `R` by crossing at most `layers` interior
//! faces. Halo cells travel from the root like owned cells, but with
//! attribute [`Attribute::Copy`].

use crate::algs::communicator::{Communicator, tags};
use crate::algs::exchange::scatter_from_root;
use crate::algs::wire::{WireOverlap, cast_slice, decode_records};
use crate::data::entries::{ExportEntry, GlobalIndex, ImportEntry};
use crate::grid::data::GridData;
use crate::mesh_error::MeshScatterError;
use crate::partitioning::PartitionId;
use crate::topology::ownership::Attribute;
use itertools::Itertools;
use std::collections::VecDeque;

/// Halo cells of every rank, each list sorted by global index.
///
/// Runs on the serial grid; `parts[c]` is the owner of cell `c`.
pub fn halo_cells(
    grid: &GridData,
    parts: &[PartitionId],
    n_ranks: usize,
    layers: usize,
) -> Vec<Vec<GlobalIndex>> {
    let n = grid.num_cells().min(parts.len());
    let mut depth = vec![usize::MAX; n];
    let mut touched = Vec::new();
    let mut queue = VecDeque::new();

    (0..n_ranks)
        .map(|rank| {
            for cell in (0..n).filter(|&c| parts[c] == rank) {
                depth[cell] = 0;
                touched.push(cell);
                queue.push_back(cell);
            }
            let mut halo = Vec::new();
            while let Some(cell) = queue.pop_front() {
                if depth[cell] == layers {
                    continue;
                }
                for (nb, _) in grid.neighbors(cell) {
                    if nb < n && depth[nb] == usize::MAX {
                        depth[nb] = depth[cell] + 1;
                        touched.push(nb);
                        queue.push_back(nb);
                        halo.push(nb);
                    }
                }
            }
            for c in touched.drain(..) {
                depth[c] = usize::MAX;
            }
            halo.sort_unstable();
            halo
        })
        .collect()
}

/// Append halo entries to the owner lists built by a partition provider.
///
/// Collective. On `root`, `export` gains one copy entry per (halo cell,
/// rank) pair, merged in global order after the owner entries. Every rank
/// receives its halo cells from the root and appends them to `import`.
/// Returns the number of owner entries at the front of `import`, which is
/// what local numbering needs.
pub fn add_overlap_layer<C: Communicator>(
    grid: &GridData,
    parts: &[PartitionId],
    export: &mut Vec<ExportEntry>,
    import: &mut Vec<ImportEntry>,
    comm: &C,
    root: usize,
    layers: usize,
) -> Result<usize, MeshScatterError> {
    let num_imported_owner = import.len();
    if layers == 0 {
        return Ok(num_imported_owner);
    }

    let per_rank: Vec<Vec<u8>> = if comm.rank() == root {
        let halos = halo_cells(grid, parts, comm.size(), layers);
        let copies = halos
            .iter()
            .enumerate()
            .flat_map(|(rank, cells)| {
                cells
                    .iter()
                    .map(move |&g| ExportEntry::new(g, rank, Attribute::Copy))
            })
            .sorted_by_key(|e| (e.global, e.rank))
            .dedup_by(|a, b| (a.global, a.rank) == (b.global, b.rank));
        let owners = std::mem::take(export);
        *export = owners
            .into_iter()
            .merge_by(copies, |a, b| a.global <= b.global)
            .collect();

        halos
            .iter()
            .map(|cells| {
                let wire: Vec<WireOverlap> = cells
                    .iter()
                    .map(|&g| WireOverlap::new(g, Attribute::Copy))
                    .collect();
                cast_slice(&wire).to_vec()
            })
            .collect()
    } else {
        Vec::new()
    };

    let mine = scatter_from_root(comm, root, tags::OVERLAP, &per_rank)?;
    let records = decode_records::<WireOverlap>(&mine, root)?;
    import.reserve(records.len());
    for rec in &records {
        import.push(ImportEntry::new(rec.global(), root, rec.attribute()?));
    }

    log::debug!(
        "rank {}: {} owned and {} overlap cells after {layers} layer(s)",
        comm.rank(),
        num_imported_owner,
        records.len()
    );
    Ok(num_imported_owner)
}
