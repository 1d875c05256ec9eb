//! One view of a cell grid: either the serial grid held by the root, or the
//! fragment a process holds after distribution.
//!
//! Cells are numbered `0..num_cells()`. In the serial view that number *is*
//! the global cell index; in a distributed view it is the local index from
//! [`GridData::cell_index_set`]. Each cell also carries its logical Cartesian
//! index (`global_cell`), volume and centroid. Interior faces connect exactly
//! two cells.

use crate::data::index_set::ParallelIndexSet;
use crate::mesh_error::MeshScatterError;
use hashbrown::HashMap;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridData {
    logical_cartesian_size: [usize; 3],
    global_cell: Vec<usize>,
    cell_volumes: Vec<f64>,
    cell_centroids: Vec<[f64; 3]>,
    face_cells: Vec<[usize; 2]>,
    cell_faces: Vec<Vec<usize>>,
    cell_index_set: ParallelIndexSet,
}

impl GridData {
    /// A view with no cells but a known logical Cartesian size.
    pub fn empty(logical_cartesian_size: [usize; 3]) -> Self {
        Self {
            logical_cartesian_size,
            ..Self::default()
        }
    }

    /// All-active Cartesian grid with `dims` cells of size `cell_size`.
    ///
    /// The `i` index runs fastest, then `j`, then `k`. Faces are listed
    /// i-direction first, then j, then k.
    pub fn cartesian(dims: [usize; 3], cell_size: [f64; 3]) -> Self {
        let [nx, ny, nz] = dims;
        let n = nx * ny * nz;
        let idx = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);
        let volume = cell_size[0] * cell_size[1] * cell_size[2];

        let mut centroids = Vec::with_capacity(n);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    centroids.push([
                        (i as f64 + 0.5) * cell_size[0],
                        (j as f64 + 0.5) * cell_size[1],
                        (k as f64 + 0.5) * cell_size[2],
                    ]);
                }
            }
        }

        let mut faces = Vec::new();
        for (di, dj, dk) in [(1, 0, 0), (0, 1, 0), (0, 0, 1)] {
            for k in 0..nz.saturating_sub(dk) {
                for j in 0..ny.saturating_sub(dj) {
                    for i in 0..nx.saturating_sub(di) {
                        faces.push([idx(i, j, k), idx(i + di, j + dj, k + dk)]);
                    }
                }
            }
        }

        let cell_faces = build_cell_faces(n, &faces);
        Self {
            logical_cartesian_size: dims,
            global_cell: (0..n).collect(),
            cell_volumes: vec![volume; n],
            cell_centroids: centroids,
            face_cells: faces,
            cell_faces,
            cell_index_set: ParallelIndexSet::default(),
        }
    }

    /// Build a view from explicit per-cell and per-face arrays.
    pub fn from_parts(
        logical_cartesian_size: [usize; 3],
        global_cell: Vec<usize>,
        cell_volumes: Vec<f64>,
        cell_centroids: Vec<[f64; 3]>,
        face_cells: Vec<[usize; 2]>,
    ) -> Result<Self, MeshScatterError> {
        let n = global_cell.len();
        if cell_volumes.len() != n || cell_centroids.len() != n {
            return Err(MeshScatterError::InvalidGridData(format!(
                "{n} cells but {} volumes and {} centroids",
                cell_volumes.len(),
                cell_centroids.len()
            )));
        }
        let cartesian_cells: usize = logical_cartesian_size.iter().product();
        if let Some(&c) = global_cell.iter().find(|&&c| c >= cartesian_cells) {
            return Err(MeshScatterError::InvalidGridData(format!(
                "Cartesian index {c} outside logical size {logical_cartesian_size:?}"
            )));
        }
        if let Some(f) = face_cells
            .iter()
            .position(|&[a, b]| a >= n || b >= n || a == b)
        {
            return Err(MeshScatterError::InvalidGridData(format!(
                "face {f} connects {:?}, which is not a pair of distinct cells",
                face_cells[f]
            )));
        }
        let cell_faces = build_cell_faces(n, &face_cells);
        Ok(Self {
            logical_cartesian_size,
            global_cell,
            cell_volumes,
            cell_centroids,
            face_cells,
            cell_faces,
            cell_index_set: ParallelIndexSet::default(),
        })
    }

    pub fn num_cells(&self) -> usize {
        self.global_cell.len()
    }

    pub fn num_faces(&self) -> usize {
        self.face_cells.len()
    }

    pub fn logical_cartesian_size(&self) -> [usize; 3] {
        self.logical_cartesian_size
    }

    /// Logical Cartesian index of every cell.
    pub fn global_cell(&self) -> &[usize] {
        &self.global_cell
    }

    pub fn cell_volume(&self, cell: usize) -> Option<f64> {
        self.cell_volumes.get(cell).copied()
    }

    pub fn cell_centroid(&self, cell: usize) -> Option<[f64; 3]> {
        self.cell_centroids.get(cell).copied()
    }

    pub fn face_cells(&self) -> &[[usize; 2]] {
        &self.face_cells
    }

    /// Faces touching `cell`.
    pub fn cell_faces(&self, cell: usize) -> &[usize] {
        self.cell_faces.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(neighbor, face)` pairs of `cell` across interior faces.
    pub fn neighbors(&self, cell: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cell_faces(cell).iter().map(move |&f| {
            let [a, b] = self.face_cells[f];
            (if a == cell { b } else { a }, f)
        })
    }

    /// Map from logical Cartesian index to cell index.
    pub fn cartesian_to_compressed(&self) -> HashMap<usize, usize> {
        self.global_cell
            .iter()
            .enumerate()
            .map(|(cell, &cart)| (cart, cell))
            .collect()
    }

    /// Parallel index set of the cells in this view (empty for a serial view).
    pub fn cell_index_set(&self) -> &ParallelIndexSet {
        &self.cell_index_set
    }

    pub(crate) fn set_cell_index_set(&mut self, index_set: ParallelIndexSet) {
        self.cell_index_set = index_set;
    }
}

fn build_cell_faces(num_cells: usize, faces: &[[usize; 2]]) -> Vec<Vec<usize>> {
    let mut cell_faces = vec![Vec::new(); num_cells];
    for (f, &[a, b]) in faces.iter().enumerate() {
        cell_faces[a].push(f);
        cell_faces[b].push(f);
    }
    cell_faces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cartesian_counts() {
        let g = GridData::cartesian([3, 2, 2], [1.0, 2.0, 0.5]);
        assert_eq!(g.num_cells(), 12);
        // 2*2*2 + 3*1*2 + 3*2*1
        assert_eq!(g.num_faces(), 8 + 6 + 6);
        assert_eq!(g.cell_volume(0), Some(1.0));
        assert_eq!(g.cell_centroid(4), Some([1.5, 3.0, 0.25]));
    }

    #[test]
    fn neighbors_of_corner_cell() {
        let g = GridData::cartesian([2, 2, 1], [1.0; 3]);
        let mut nbrs: Vec<_> = g.neighbors(0).map(|(n, _)| n).collect();
        nbrs.sort_unstable();
        assert_eq!(nbrs, vec![1, 2]);
    }

    #[test]
    fn from_parts_validates_faces() {
        let err = GridData::from_parts(
            [2, 1, 1],
            vec![0, 1],
            vec![1.0; 2],
            vec![[0.0; 3]; 2],
            vec![[0, 0]],
        );
        assert!(matches!(err, Err(MeshScatterError::InvalidGridData(_))));

        let err = GridData::from_parts([1, 1, 1], vec![0, 1], vec![1.0; 2], vec![[0.0; 3]; 2], vec![]);
        assert!(matches!(err, Err(MeshScatterError::InvalidGridData(_))));
    }

    #[test]
    fn compressed_lookup() {
        let g = GridData::from_parts(
            [4, 1, 1],
            vec![1, 3],
            vec![1.0; 2],
            vec![[0.0; 3]; 2],
            vec![[0, 1]],
        )
        .unwrap();
        let map = g.cartesian_to_compressed();
        assert_eq!(map.get(&3), Some(&1));
        assert_eq!(map.get(&0), None);
    }
}
