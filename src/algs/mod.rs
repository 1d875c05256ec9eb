//! Re-export public algorithms.

pub mod communicator;
pub mod distribute;
pub mod exchange;
pub mod partition;
pub mod wire;

pub use distribute::build_distributed_index;
pub use partition::{PartitionProvider, PartitionResult};
