//! Entry-point for cell graph partitioning on the root process.
//!
//! The cell graph has one vertex per cell and one edge per interior face.
//! Edge weights come from per-face transmissibilities according to an
//! [`EdgeWeightMethod`]; the [`PartitionBackend`] decides which algorithm
//! turns the weighted graph into a cell → rank assignment.

pub mod graph_growing;
#[cfg(feature = "metis-support")]
pub mod metis_backend;
pub mod wells;

use crate::grid::data::GridData;
use crate::mesh_error::MeshScatterError;

pub type PartitionId = usize;

/// How face transmissibilities become edge weights.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EdgeWeightMethod {
    /// Every face weighs 1.
    #[default]
    Uniform,
    /// The face transmissibility itself.
    Transmissibility,
    /// `ln(1 + t)`; flattens the large dynamic range of transmissibilities.
    LogTransmissibility,
}

/// Partitioning algorithm.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PartitionBackend {
    /// Built-in weighted graph growing.
    #[default]
    Native,
    /// METIS k-way (feature `metis-support`).
    Metis,
}

impl PartitionBackend {
    pub fn name(self) -> &'static str {
        match self {
            PartitionBackend::Native => "native",
            PartitionBackend::Metis => "metis",
        }
    }

    /// Fail with a configuration error if this backend is not compiled in.
    pub fn ensure_available(self) -> Result<(), MeshScatterError> {
        match self {
            PartitionBackend::Native => Ok(()),
            PartitionBackend::Metis if cfg!(feature = "metis-support") => Ok(()),
            PartitionBackend::Metis => Err(MeshScatterError::MissingPartitionBackend {
                backend: self.name(),
            }),
        }
    }
}

/// Per-face edge weights for `grid`.
///
/// Without transmissibilities every method degrades to uniform weights.
pub fn edge_weights(
    grid: &GridData,
    method: EdgeWeightMethod,
    transmissibilities: Option<&[f64]>,
) -> Result<Vec<f64>, MeshScatterError> {
    let trans = match (method, transmissibilities) {
        (EdgeWeightMethod::Uniform, _) => return Ok(vec![1.0; grid.num_faces()]),
        (_, None) => {
            log::warn!("{method:?} edge weights requested without transmissibilities; using uniform weights");
            return Ok(vec![1.0; grid.num_faces()]);
        }
        (_, Some(t)) => t,
    };
    if trans.len() != grid.num_faces() {
        return Err(MeshScatterError::InvalidWeights {
            expected: grid.num_faces(),
            found: trans.len(),
        });
    }
    Ok(match method {
        EdgeWeightMethod::LogTransmissibility => {
            trans.iter().map(|&t| t.max(0.0).ln_1p()).collect()
        }
        _ => trans.iter().map(|&t| t.max(0.0)).collect(),
    })
}

/// Assign every cell of `grid` to one of `n_parts` parts.
pub fn partition_cells(
    grid: &GridData,
    weights: &[f64],
    n_parts: usize,
    backend: PartitionBackend,
) -> Result<Vec<PartitionId>, MeshScatterError> {
    backend.ensure_available()?;
    if n_parts == 0 {
        return Err(MeshScatterError::Partitioner(
            "cannot partition into zero parts".into(),
        ));
    }
    match backend {
        PartitionBackend::Native => Ok(graph_growing::grow_partition(grid, weights, n_parts)),
        #[cfg(feature = "metis-support")]
        PartitionBackend::Metis => metis_backend::metis_partition(grid, weights, n_parts),
        #[cfg(not(feature = "metis-support"))]
        PartitionBackend::Metis => Err(MeshScatterError::MissingPartitionBackend {
            backend: backend.name(),
        }),
    }
}
