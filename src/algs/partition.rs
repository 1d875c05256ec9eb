//! Partition providers: who decides which rank owns each cell.
//!
//! Every provider is collective. It returns the same cell → rank assignment
//! on every rank together with the owner export/import lists the overlap
//! expander and the index builder start from:
//! - the root exports every cell to its owner (attribute owner), in global
//!   index order;
//! - every rank imports the cells it owns from the root (attribute owner),
//!   in global index order.
//!
//! The root may be one of the owners; it then sends to and receives from
//! itself.

use crate::algs::communicator::{Communicator, tags};
use crate::algs::exchange::{all_gather_u64, broadcast_bytes};
use crate::algs::wire::{WireU64, cast_slice, decode_records};
use crate::data::entries::{ExportEntry, ImportEntry};
use crate::grid::data::GridData;
use crate::mesh_error::MeshScatterError;
use crate::partitioning::wells::{
    Well, WellConnections, compute_defunct_well_names, post_process_partitioning_for_wells,
};
use crate::partitioning::{
    EdgeWeightMethod, PartitionBackend, PartitionId, edge_weights, partition_cells,
};
use crate::topology::ownership::Attribute;
use itertools::Itertools;
use std::collections::BTreeSet;

const STATUS_OK: u64 = 0;
const STATUS_FAILED: u64 = 1;

/// Outcome of a partitioning step, as seen by one rank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionResult {
    /// Owning rank of every global cell (identical on all ranks).
    pub cell_part: Vec<PartitionId>,
    /// Wells left without any active perforation.
    pub defunct_wells: BTreeSet<String>,
    /// Cells this rank sends; non-empty on the root only.
    pub export_list: Vec<ExportEntry>,
    /// Owned cells this rank receives from the root.
    pub import_list: Vec<ImportEntry>,
}

/// Collective cell → rank assignment.
pub trait PartitionProvider {
    /// Partition the serial `grid` (populated on `root` only) among the ranks
    /// of `comm`. Must be called by every rank in lock-step.
    fn partition<C: Communicator>(
        &self,
        grid: &GridData,
        wells: Option<&[Well]>,
        transmissibilities: Option<&[f64]>,
        comm: &C,
        method: EdgeWeightMethod,
        root: usize,
    ) -> Result<PartitionResult, MeshScatterError>;
}

/// Export and import lists of rank `rank` for the assignment `parts`.
pub fn owner_lists(
    parts: &[PartitionId],
    rank: usize,
    root: usize,
) -> (Vec<ExportEntry>, Vec<ImportEntry>) {
    let export = if rank == root {
        parts
            .iter()
            .enumerate()
            .map(|(global, &owner)| ExportEntry::new(global, owner, Attribute::Owner))
            .collect()
    } else {
        Vec::new()
    };
    let import = parts
        .iter()
        .positions(|&owner| owner == rank)
        .map(|global| ImportEntry::new(global, root, Attribute::Owner))
        .collect();
    (export, import)
}

pub(crate) fn check_root<C: Communicator>(comm: &C, root: usize) -> Result<(), MeshScatterError> {
    if root < comm.size() {
        Ok(())
    } else {
        Err(MeshScatterError::RootRankOutOfRange {
            root,
            size: comm.size(),
        })
    }
}

fn check_ranks(parts: &[PartitionId], size: usize) -> Result<(), MeshScatterError> {
    match parts.iter().position(|&p| p >= size) {
        Some(cell) => Err(MeshScatterError::PartitionRankOutOfRange {
            cell,
            rank: parts[cell],
            size,
        }),
        None => Ok(()),
    }
}

/// Partitions the cell graph on the root and broadcasts the result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RootPartitioner {
    pub backend: PartitionBackend,
}

impl RootPartitioner {
    pub fn new(backend: PartitionBackend) -> Self {
        Self { backend }
    }

    fn compute_on_root(
        &self,
        grid: &GridData,
        wells: Option<&[Well]>,
        transmissibilities: Option<&[f64]>,
        n_parts: usize,
        method: EdgeWeightMethod,
    ) -> Result<(Vec<PartitionId>, BTreeSet<String>), MeshScatterError> {
        let weights = edge_weights(grid, method, transmissibilities)?;
        let mut parts = partition_cells(grid, &weights, n_parts, self.backend)?;
        if parts.len() != grid.num_cells() {
            return Err(MeshScatterError::PartitionLengthMismatch {
                expected: grid.num_cells(),
                found: parts.len(),
            });
        }
        check_ranks(&parts, n_parts)?;

        let defunct = match wells {
            Some(wells) => {
                let connections = WellConnections::new(
                    wells,
                    grid.logical_cartesian_size(),
                    &grid.cartesian_to_compressed(),
                );
                let well_parts = post_process_partitioning_for_wells(&mut parts, &connections);
                compute_defunct_well_names(&well_parts, wells)
            }
            None => BTreeSet::new(),
        };
        Ok((parts, defunct))
    }
}

fn decode_partition(bytes: &[u8], root: usize) -> Result<Vec<PartitionId>, MeshScatterError> {
    let (status, body) = bytes
        .split_at_checked(size_of::<WireU64>())
        .ok_or_else(|| MeshScatterError::CommError {
            neighbor: root,
            message: "partition message lacks a status word".into(),
        })?;
    match decode_records::<WireU64>(status, root)?[0].get() {
        STATUS_OK => Ok(decode_records::<WireU64>(body, root)?
            .iter()
            .map(|p| p.get() as usize)
            .collect()),
        _ => Err(MeshScatterError::Partitioner(format!(
            "partitioning failed on root rank {root}: {}",
            String::from_utf8_lossy(body)
        ))),
    }
}

fn encode_status(status: u64, body: &[u8]) -> Vec<u8> {
    let mut out = cast_slice(&[WireU64::of(status)]).to_vec();
    out.extend_from_slice(body);
    out
}

impl PartitionProvider for RootPartitioner {
    fn partition<C: Communicator>(
        &self,
        grid: &GridData,
        wells: Option<&[Well]>,
        transmissibilities: Option<&[f64]>,
        comm: &C,
        method: EdgeWeightMethod,
        root: usize,
    ) -> Result<PartitionResult, MeshScatterError> {
        // Same answer on every rank, so failing here needs no agreement.
        self.backend.ensure_available()?;
        check_root(comm, root)?;
        let me = comm.rank();

        let computed = (me == root)
            .then(|| self.compute_on_root(grid, wells, transmissibilities, comm.size(), method));
        let payload = match &computed {
            Some(Ok((parts, _))) => {
                let wire: Vec<WireU64> = parts.iter().map(|&p| WireU64::of(p as u64)).collect();
                encode_status(STATUS_OK, cast_slice(&wire))
            }
            Some(Err(e)) => encode_status(STATUS_FAILED, e.to_string().as_bytes()),
            None => Vec::new(),
        };
        let received = broadcast_bytes(comm, root, tags::PARTITION, &payload)?;
        let (cell_part, defunct_local) = match computed {
            Some(Err(e)) => return Err(e),
            Some(Ok((parts, defunct))) => (parts, defunct),
            None => (decode_partition(&received, root)?, BTreeSet::new()),
        };

        let names = defunct_local.iter().join("\n");
        let names = broadcast_bytes(comm, root, tags::DEFUNCT_WELLS, names.as_bytes())?;
        let defunct_wells = String::from_utf8(names)
            .map_err(|e| MeshScatterError::CommError {
                neighbor: root,
                message: format!("defunct well names are not UTF-8: {e}"),
            })?
            .split('\n')
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        let (export_list, import_list) = owner_lists(&cell_part, me, root);
        log::debug!(
            "rank {me}: {} cells partitioned by {} backend, {} owned here",
            cell_part.len(),
            self.backend.name(),
            import_list.len()
        );
        Ok(PartitionResult {
            cell_part,
            defunct_wells,
            export_list,
            import_list,
        })
    }
}

/// A caller-supplied assignment, known on every rank.
///
/// Wells and edge weights are ignored; no well is reported defunct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProvidedPartition<'a> {
    pub parts: &'a [PartitionId],
}

impl<'a> ProvidedPartition<'a> {
    pub fn new(parts: &'a [PartitionId]) -> Self {
        Self { parts }
    }
}

impl PartitionProvider for ProvidedPartition<'_> {
    fn partition<C: Communicator>(
        &self,
        grid: &GridData,
        _wells: Option<&[Well]>,
        _transmissibilities: Option<&[f64]>,
        comm: &C,
        _method: EdgeWeightMethod,
        root: usize,
    ) -> Result<PartitionResult, MeshScatterError> {
        check_root(comm, root)?;
        let me = comm.rank();

        // Only the root knows the global cell count.
        let local_check = if me == root && self.parts.len() != grid.num_cells() {
            Err(MeshScatterError::PartitionLengthMismatch {
                expected: grid.num_cells(),
                found: self.parts.len(),
            })
        } else {
            check_ranks(self.parts, comm.size())
        };
        let flags = all_gather_u64(
            comm,
            tags::PARTITION,
            if local_check.is_ok() { STATUS_OK } else { STATUS_FAILED },
        )?;
        local_check?;
        if let Some(rank) = flags.iter().position(|&f| f != STATUS_OK) {
            return Err(MeshScatterError::Partitioner(format!(
                "supplied partition rejected by rank {rank}"
            )));
        }

        let (export_list, import_list) = owner_lists(self.parts, me, root);
        Ok(PartitionResult {
            cell_part: self.parts.to_vec(),
            defunct_wells: BTreeSet::new(),
            export_list,
            import_list,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, run_world};

    #[test]
    fn owner_lists_on_root_and_peer() {
        let parts = [1, 0, 1];
        let (export, import) = owner_lists(&parts, 0, 0);
        assert_eq!(
            export.iter().map(|e| (e.global, e.rank)).collect::<Vec<_>>(),
            vec![(0, 1), (1, 0), (2, 1)]
        );
        assert_eq!(import.iter().map(|e| e.global).collect::<Vec<_>>(), vec![1]);

        let (export, import) = owner_lists(&parts, 1, 0);
        assert!(export.is_empty());
        assert!(import.iter().all(|e| e.rank == 0 && e.attribute == Attribute::Owner));
        assert_eq!(import.iter().map(|e| e.global).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn root_partition_reaches_every_rank() {
        let results = run_world(3, |comm| {
            let grid = if comm.rank() == 0 {
                GridData::cartesian([6, 1, 1], [1.0; 3])
            } else {
                GridData::empty([6, 1, 1])
            };
            RootPartitioner::default()
                .partition(&grid, None, None, &comm, EdgeWeightMethod::Uniform, 0)
                .unwrap()
        });
        for (rank, r) in results.iter().enumerate() {
            assert_eq!(r.cell_part, vec![0, 0, 1, 1, 2, 2]);
            assert_eq!(r.export_list.len(), if rank == 0 { 6 } else { 0 });
            assert_eq!(
                r.import_list.iter().map(|e| e.global).collect::<Vec<_>>(),
                vec![2 * rank, 2 * rank + 1]
            );
        }
    }

    #[test]
    fn defunct_wells_are_known_everywhere() {
        let results = run_world(2, |comm| {
            let grid = if comm.rank() == 1 {
                GridData::cartesian([4, 1, 1], [1.0; 3])
            } else {
                GridData::empty([4, 1, 1])
            };
            let wells = [
                Well::new("PROD", vec![[1, 0, 0], [2, 0, 0], [3, 0, 0]]),
                Well::new("GHOST", vec![[9, 9, 9]]),
            ];
            RootPartitioner::default()
                .partition(&grid, Some(&wells), None, &comm, EdgeWeightMethod::Uniform, 1)
                .unwrap()
        });
        for r in &results {
            // grown as [0,0,1,1], then PROD pulls cell 1 to rank 1
            assert_eq!(r.cell_part, vec![0, 1, 1, 1]);
            assert_eq!(r.defunct_wells.iter().collect::<Vec<_>>(), vec!["GHOST"]);
        }
        assert_eq!(results[1].export_list.len(), 4);
        assert!(results[0].export_list.is_empty());
    }

    #[test]
    fn root_failure_is_reported_on_every_rank() {
        let results = run_world(2, |comm| {
            let grid = if comm.rank() == 0 {
                GridData::cartesian([3, 1, 1], [1.0; 3])
            } else {
                GridData::empty([3, 1, 1])
            };
            RootPartitioner::default().partition(
                &grid,
                None,
                Some(&[1.0]),
                &comm,
                EdgeWeightMethod::Transmissibility,
                0,
            )
        });
        assert_eq!(
            results[0],
            Err(MeshScatterError::InvalidWeights {
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(results[1], Err(MeshScatterError::Partitioner(_))));
    }

    #[test]
    fn provided_partition_is_validated_collectively() {
        let results = run_world(2, |comm| {
            let grid = if comm.rank() == 0 {
                GridData::cartesian([2, 1, 1], [1.0; 3])
            } else {
                GridData::empty([2, 1, 1])
            };
            let parts = [0, 5];
            ProvidedPartition::new(&parts).partition(
                &grid,
                None,
                None,
                &comm,
                EdgeWeightMethod::Uniform,
                0,
            )
        });
        for r in results {
            assert_eq!(
                r,
                Err(MeshScatterError::PartitionRankOutOfRange {
                    cell: 1,
                    rank: 5,
                    size: 2
                })
            );
        }
    }

    #[test]
    fn provided_partition_length_checked_on_root() {
        let grid = GridData::cartesian([3, 1, 1], [1.0; 3]);
        let parts = [0, 0];
        let r = ProvidedPartition::new(&parts).partition(
            &grid,
            None,
            None,
            &NoComm,
            EdgeWeightMethod::Uniform,
            0,
        );
        assert_eq!(
            r,
            Err(MeshScatterError::PartitionLengthMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn bad_root_is_rejected() {
        let grid = GridData::cartesian([2, 1, 1], [1.0; 3]);
        let r = RootPartitioner::default().partition(
            &grid,
            None,
            None,
            &NoComm,
            EdgeWeightMethod::Uniform,
            3,
        );
        assert_eq!(r, Err(MeshScatterError::RootRankOutOfRange { root: 3, size: 1 }));
    }
}
