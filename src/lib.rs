#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-scatter
//!
//! mesh-scatter distributes a cell grid held by one process across a group of
//! cooperating processes. Starting from the serial grid on a root rank it
//! partitions the cells, grows every partition by overlap (halo) layers,
//! numbers the cells each process holds, and builds the parallel index set and
//! the per-neighbor send/receive interfaces that later halo exchanges run on.
//!
//! ## Features
//! - Collective [`Grid::scatter_grid`](grid::Grid::scatter_grid) with explicit
//!   skip outcomes and a fail-everywhere empty-partition check
//! - Two local numbering policies, see [`LocalOrdering`](algs::distribute::LocalOrdering)
//! - Pluggable communication backends (serial, in-process threads, MPI)
//! - Built-in graph-growing partitioner, METIS behind `metis-support`
//! - Wells kept on a single process
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-scatter = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "metis-support"]
//! ```
//!
//! Every rank runs the same code:
//!
//! ```no_run
//! use mesh_scatter::prelude::*;
//!
//! # fn run<C: Communicator>(comm: C) -> Result<(), MeshScatterError> {
//! let mut grid = Grid::create_cartesian(comm, [10, 10, 3], [1.0, 1.0, 0.5])?;
//! match grid.scatter_grid(EdgeWeightMethod::Uniform, None, None, 1)? {
//!     ScatterStatus::Distributed { defunct_wells } => {
//!         assert!(defunct_wells.is_empty());
//!     }
//!     ScatterStatus::Skipped(reason) => println!("not distributed: {reason:?}"),
//! }
//! println!("{} local cells", grid.num_cells());
//! # Ok(())
//! # }
//! ```

// Re-export our major subsystems:
pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod grid;
pub mod mesh_error;
pub mod overlap;
pub mod partitioning;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, NoComm, RayonComm};
    pub use crate::algs::distribute::{DistributedIndex, LocalOrdering, build_distributed_index};
    pub use crate::algs::partition::{PartitionProvider, ProvidedPartition, RootPartitioner};
    pub use crate::data::entries::{ExportEntry, ImportEntry};
    pub use crate::data::index_set::ParallelIndexSet;
    pub use crate::data::interface::{InterfaceMap, InterfaceSide};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::grid::data::GridData;
    pub use crate::grid::{
        DistributionConfig, DistributionState, Grid, ScatterStatus, SkipReason,
    };
    pub use crate::mesh_error::MeshScatterError;
    pub use crate::partitioning::wells::Well;
    pub use crate::partitioning::{EdgeWeightMethod, PartitionBackend};
    pub use crate::topology::ownership::Attribute;
}
