//! Greedy weighted graph growing.
//!
//! Parts are grown one after another. A part starts at the lowest-index
//! unassigned cell and repeatedly absorbs the unassigned frontier cell with
//! the largest summed edge weight into the part (ties: lowest cell index)
//! until it reaches `ceil(n / n_parts)` cells. If the frontier runs dry the
//! part reseeds at the next unassigned cell. The last part takes whatever is
//! left. The result is deterministic.

use super::PartitionId;
use crate::grid::data::GridData;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

const UNASSIGNED: usize = usize::MAX;

#[derive(Copy, Clone, Debug, PartialEq)]
struct Gain(f64);

impl Eq for Gain {}

impl PartialOrd for Gain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Gain {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

pub fn grow_partition(grid: &GridData, weights: &[f64], n_parts: usize) -> Vec<PartitionId> {
    let n = grid.num_cells();
    let mut parts = vec![UNASSIGNED; n];
    if n_parts == 0 {
        return parts;
    }
    let target = n.div_ceil(n_parts);
    let mut gain = vec![0.0f64; n];
    let mut touched: Vec<usize> = Vec::new();
    let mut next_seed = 0usize;
    let mut assigned = 0usize;

    for part in 0..n_parts {
        let quota = if part + 1 == n_parts {
            n - assigned
        } else {
            target.min(n - assigned)
        };
        let mut frontier: BinaryHeap<(Gain, Reverse<usize>)> = BinaryHeap::new();
        let mut taken = 0usize;

        while taken < quota {
            let cell = loop {
                match frontier.pop() {
                    Some((Gain(g), Reverse(c))) if parts[c] == UNASSIGNED && g == gain[c] => {
                        break Some(c);
                    }
                    Some(_) => continue,
                    None => break None,
                }
            };
            let cell = match cell {
                Some(c) => c,
                None => {
                    while parts[next_seed] != UNASSIGNED {
                        next_seed += 1;
                    }
                    next_seed
                }
            };

            parts[cell] = part;
            taken += 1;
            assigned += 1;
            for (nb, face) in grid.neighbors(cell) {
                if parts[nb] == UNASSIGNED {
                    if gain[nb] == 0.0 {
                        touched.push(nb);
                    }
                    gain[nb] += weights.get(face).copied().unwrap_or(1.0);
                    frontier.push((Gain(gain[nb]), Reverse(nb)));
                }
            }
        }

        // gains are relative to the part being grown
        for c in touched.drain(..) {
            gain[c] = 0.0;
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_slabs_on_a_line() {
        let g = GridData::cartesian([6, 1, 1], [1.0; 3]);
        let w = vec![1.0; g.num_faces()];
        assert_eq!(grow_partition(&g, &w, 3), vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn strong_faces_pull_cells_together() {
        // 2x2 grid: cells 0,1 / 2,3. Faces: [0-1], [2-3], [0-2], [1-3].
        let g = GridData::cartesian([2, 2, 1], [1.0; 3]);
        let w = vec![1.0, 1.0, 10.0, 10.0];
        assert_eq!(grow_partition(&g, &w, 2), vec![0, 1, 0, 1]);
    }

    #[test]
    fn disconnected_cells_reseed() {
        let g = GridData::from_parts(
            [4, 1, 1],
            vec![0, 1, 2, 3],
            vec![1.0; 4],
            vec![[0.0; 3]; 4],
            vec![[0, 3]],
        )
        .unwrap();
        let w = vec![1.0];
        assert_eq!(grow_partition(&g, &w, 2), vec![0, 1, 1, 0]);
    }

    #[test]
    fn more_parts_than_cells_leaves_parts_empty() {
        let g = GridData::cartesian([2, 1, 1], [1.0; 3]);
        let parts = grow_partition(&g, &[1.0], 3);
        assert_eq!(parts, vec![0, 1]);
    }
}
