//! Keep every well on a single process.
//!
//! A well perforates a set of cells given by logical `(i, j, k)` coordinates.
//! After partitioning, all active perforated cells of a well are moved to the
//! part that already holds most of them, so no well is split across ranks.
//! A well without any active perforation is *defunct*.

use super::PartitionId;
use hashbrown::HashMap;
use itertools::Itertools;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Well {
    pub name: String,
    /// Logical Cartesian `(i, j, k)` of each perforation.
    pub connections: Vec<[usize; 3]>,
}

impl Well {
    pub fn new(name: impl Into<String>, connections: Vec<[usize; 3]>) -> Self {
        Self {
            name: name.into(),
            connections,
        }
    }
}

/// Active cells perforated by each well, in well order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WellConnections {
    cells: Vec<Vec<usize>>,
}

impl WellConnections {
    /// Resolve perforations to cell indices.
    ///
    /// Perforations outside `cartesian_size` or in inactive cells are dropped;
    /// repeated perforations of one cell count once.
    pub fn new(
        wells: &[Well],
        cartesian_size: [usize; 3],
        cartesian_to_compressed: &HashMap<usize, usize>,
    ) -> Self {
        let [nx, ny, nz] = cartesian_size;
        let cells = wells
            .iter()
            .map(|well| {
                well.connections
                    .iter()
                    .filter(|&&[i, j, k]| i < nx && j < ny && k < nz)
                    .filter_map(|&[i, j, k]| {
                        cartesian_to_compressed
                            .get(&(i + nx * (j + ny * k)))
                            .copied()
                    })
                    .sorted_unstable()
                    .dedup()
                    .collect()
            })
            .collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Active cells of well `well`.
    pub fn cells(&self, well: usize) -> &[usize] {
        self.cells.get(well).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Move the cells of each well onto the part owning most of them.
///
/// Ties go to the lowest part. Wells are handled in order, so a cell shared
/// by two wells ends up with the later one. Returns the part of each well,
/// `None` for defunct wells.
pub fn post_process_partitioning_for_wells(
    parts: &mut [PartitionId],
    connections: &WellConnections,
) -> Vec<Option<PartitionId>> {
    (0..connections.len())
        .map(|w| {
            let cells = connections.cells(w);
            let (owner, _) = cells
                .iter()
                .map(|&c| parts[c])
                .counts()
                .into_iter()
                .max_by(|(pa, ca), (pb, cb)| ca.cmp(cb).then(pb.cmp(pa)))?;
            for &c in cells {
                parts[c] = owner;
            }
            Some(owner)
        })
        .collect()
}

/// Names of wells that ended up on no part.
pub fn compute_defunct_well_names(
    well_parts: &[Option<PartitionId>],
    wells: &[Well],
) -> BTreeSet<String> {
    wells
        .iter()
        .zip(well_parts)
        .filter(|(_, part)| part.is_none())
        .map(|(well, _)| well.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::data::GridData;

    #[test]
    fn well_moves_to_majority_owner() {
        let g = GridData::cartesian([4, 1, 1], [1.0; 3]);
        let wells = vec![Well::new("P1", vec![[1, 0, 0], [2, 0, 0], [3, 0, 0]])];
        let conns = WellConnections::new(&wells, [4, 1, 1], &g.cartesian_to_compressed());
        let mut parts = vec![0, 0, 1, 1];
        let owners = post_process_partitioning_for_wells(&mut parts, &conns);
        assert_eq!(owners, vec![Some(1)]);
        assert_eq!(parts, vec![0, 1, 1, 1]);
    }

    #[test]
    fn ties_go_to_lowest_part() {
        let g = GridData::cartesian([4, 1, 1], [1.0; 3]);
        let wells = vec![Well::new("I1", vec![[1, 0, 0], [2, 0, 0]])];
        let conns = WellConnections::new(&wells, [4, 1, 1], &g.cartesian_to_compressed());
        let mut parts = vec![0, 2, 1, 1];
        assert_eq!(
            post_process_partitioning_for_wells(&mut parts, &conns),
            vec![Some(1)]
        );
        assert_eq!(parts, vec![0, 1, 1, 1]);
    }

    #[test]
    fn inactive_perforations_make_a_well_defunct() {
        let g = GridData::from_parts(
            [3, 1, 1],
            vec![0, 2],
            vec![1.0; 2],
            vec![[0.0; 3]; 2],
            vec![],
        )
        .unwrap();
        let wells = vec![
            Well::new("DEAD", vec![[1, 0, 0], [7, 0, 0]]),
            Well::new("LIVE", vec![[2, 0, 0], [2, 0, 0]]),
        ];
        let conns = WellConnections::new(&wells, [3, 1, 1], &g.cartesian_to_compressed());
        assert_eq!(conns.cells(0), &[] as &[usize]);
        assert_eq!(conns.cells(1), &[1]);

        let mut parts = vec![0, 1];
        let owners = post_process_partitioning_for_wells(&mut parts, &conns);
        assert_eq!(owners, vec![None, Some(1)]);
        let defunct = compute_defunct_well_names(&owners, &wells);
        assert_eq!(defunct.into_iter().collect::<Vec<_>>(), vec!["DEAD".to_string()]);
    }
}
