//! METIS k-way backend (feature `metis-support`).

use super::PartitionId;
use crate::grid::data::GridData;
use crate::mesh_error::MeshScatterError;
use ::metis::Idx;

/// Largest integer edge weight handed to METIS.
const WEIGHT_SCALE: f64 = 1000.0;

pub fn metis_partition(
    grid: &GridData,
    weights: &[f64],
    n_parts: usize,
) -> Result<Vec<PartitionId>, MeshScatterError> {
    let n = grid.num_cells();
    if n == 0 {
        return Ok(Vec::new());
    }
    let max_w = weights.iter().copied().fold(0.0f64, f64::max);
    let scale = if max_w > 0.0 { WEIGHT_SCALE / max_w } else { 1.0 };

    let mut xadj: Vec<Idx> = Vec::with_capacity(n + 1);
    let mut adjncy: Vec<Idx> = Vec::new();
    let mut adjwgt: Vec<Idx> = Vec::new();
    xadj.push(0);
    for cell in 0..n {
        for (nb, face) in grid.neighbors(cell) {
            adjncy.push(nb as Idx);
            let w = weights.get(face).copied().unwrap_or(1.0);
            adjwgt.push((w * scale).round().max(1.0) as Idx);
        }
        xadj.push(adjncy.len() as Idx);
    }

    let mut part: Vec<Idx> = vec![0; n];
    ::metis::Graph::new(1, n_parts as Idx, &xadj, &adjncy)
        .map_err(|e| MeshScatterError::Partitioner(format!("{e:?}")))?
        .set_adjwgt(&adjwgt)
        .part_kway(&mut part)
        .map_err(|e| MeshScatterError::Partitioner(format!("{e:?}")))?;
    log::debug!("METIS partitioned {n} cells into {n_parts} parts");
    Ok(part.into_iter().map(|p| p as PartitionId).collect())
}
