//! MeshScatterError: Unified error type for mesh-scatter public APIs
//!
//! Every fallible operation of the distribution pipeline reports through this
//! enum. Variants fall into four families: configuration errors (root rank,
//! missing partitioning backend), invalid input (bad partition or grid arrays),
//! communication failures, and consistency violations detected while building
//! the distributed index space. [`MeshScatterError::EmptyPartition`] is the one
//! condition raised from a *result* rather than an input.

use thiserror::Error;

/// Unified error type for mesh-scatter operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshScatterError {
    /// The requested partitioning backend was not compiled into this build.
    #[error("Parallel runs depend on the `{backend}` partitioner, which is not available in this build")]
    MissingPartitionBackend { backend: &'static str },
    /// The partitioning backend itself reported a failure.
    #[error("Partitioner error: {0}")]
    Partitioner(String),
    /// The configured root rank does not exist in the communicator.
    #[error("Root rank {root} is outside a communicator of {size} processes")]
    RootRankOutOfRange { root: usize, size: usize },
    /// A partition array did not cover every global cell.
    #[error("Partition has {found} entries but the grid has {expected} cells")]
    PartitionLengthMismatch { expected: usize, found: usize },
    /// A partition array assigned a cell to a rank outside the communicator.
    #[error("Cell {cell} assigned to rank {rank}, but only {size} processes participate")]
    PartitionRankOutOfRange { cell: usize, rank: usize, size: usize },
    /// Per-face transmissibilities did not match the number of faces.
    #[error("Expected {expected} transmissibilities (one per face), got {found}")]
    InvalidWeights { expected: usize, found: usize },
    /// Arrays passed to a grid constructor were inconsistent.
    #[error("Invalid grid data: {0}")]
    InvalidGridData(String),
    /// The same global index was inserted twice into a parallel index set.
    #[error("Global index {0} appears more than once in the parallel index set")]
    DuplicateGlobalIndex(usize),
    /// `add`/`end_resize` called on an index set that is not open for insertion.
    #[error("Parallel index set is not in resize mode")]
    IndexSetNotResizing,
    /// `begin_resize` called twice without an intervening `end_resize`.
    #[error("Parallel index set is already in resize mode")]
    IndexSetAlreadyResizing,
    /// Local indices of an index set are not a dense permutation of `0..len`.
    #[error("Local index {local} is out of range or repeated (index set holds {len} entries)")]
    NonDenseLocalIndex { local: usize, len: usize },
    /// An import entry reached interface construction without a local index.
    #[error("Import entry for global index {global} has no local index assigned")]
    UnassignedLocalIndex { global: usize },
    /// An attribute code on the wire did not name a known attribute.
    #[error("Unknown ownership attribute code {0}")]
    UnknownAttribute(u8),
    /// A message arrived with an unexpected shape, or not at all.
    #[error("Communication with rank {neighbor} failed: {message}")]
    CommError { neighbor: usize, message: String },
    /// Message passing runtime could not be initialized.
    #[error("Failed to initialize the message passing runtime")]
    CommInit,
    /// Some process ended up with no cells after load balancing.
    #[error("After load balancing process {rank} has {cells} cells. Aborting.")]
    EmptyPartition { rank: usize, cells: usize },
}
