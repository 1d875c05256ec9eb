//! The grid handle every rank holds, and the distribution driver.
//!
//! A [`Grid`] owns up to two views: the serial view (the whole grid on the
//! root, empty elsewhere) and, after a successful [`Grid::scatter_grid`],
//! the distributed view with this rank's owned and overlap cells. One of
//! them is *current*; accessors such as [`Grid::num_cells`] read the current
//! view.
//!
//! Distribution is collective: every rank calls `scatter_grid` with the same
//! arguments. The pipeline is
//! partition → overlap expansion → local numbering → index set →
//! interfaces → materialization → empty-partition check.

pub mod data;
pub mod materialize;

use crate::algs::communicator::{Communicator, tags};
use crate::algs::distribute::{LocalOrdering, build_distributed_index};
use crate::algs::exchange::{all_gather_u64, broadcast_bytes};
use crate::algs::partition::{PartitionProvider, PartitionResult, RootPartitioner, check_root};
use crate::algs::wire::{WireU64, cast_slice, decode_records};
use crate::data::index_set::ParallelIndexSet;
use crate::data::interface::InterfaceMap;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshScatterError;
use crate::overlap::add_overlap_layer;
use crate::partitioning::wells::Well;
use crate::partitioning::{EdgeWeightMethod, PartitionBackend};
use data::GridData;
use materialize::distribute_global_grid;
use std::collections::BTreeSet;

/// Options for distributing a grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DistributionConfig {
    /// Local numbering policy. Default: [`LocalOrdering::GlobalOrder`].
    pub ordering: LocalOrdering,
    /// Rank holding the serial grid. Default: `0`.
    pub root_rank: usize,
    /// Partitioner used by [`Grid::scatter_grid`]. Default: native.
    pub backend: PartitionBackend,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            ordering: LocalOrdering::GlobalOrder,
            root_rank: 0,
            backend: PartitionBackend::Native,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DistributionState {
    #[default]
    Undistributed,
    Distributing,
    Distributed,
    /// A distribution attempt failed; the grid stays serial.
    Failed,
}

/// Why `scatter_grid` did nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    AlreadyDistributed,
    SingleProcess,
    PreviouslyFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScatterStatus {
    Distributed { defunct_wells: BTreeSet<String> },
    Skipped(SkipReason),
}

impl ScatterStatus {
    pub fn is_distributed(&self) -> bool {
        matches!(self, ScatterStatus::Distributed { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ActiveView {
    Serial,
    Distributed,
}

pub struct Grid<C: Communicator> {
    comm: C,
    config: DistributionConfig,
    serial: GridData,
    distributed: Option<GridData>,
    cell_interfaces: InterfaceMap,
    active: ActiveView,
    state: DistributionState,
}

impl<C: Communicator> Grid<C> {
    /// A grid with no cells.
    pub fn new(comm: C) -> Self {
        Self::from_data(comm, GridData::default())
    }

    /// Wrap an existing serial view. Ranks other than the root normally pass
    /// [`GridData::empty`].
    pub fn from_data(comm: C, serial: GridData) -> Self {
        Self {
            comm,
            config: DistributionConfig::default(),
            serial,
            distributed: None,
            cell_interfaces: InterfaceMap::new(),
            active: ActiveView::Serial,
            state: DistributionState::Undistributed,
        }
    }

    /// All-active Cartesian grid built on rank 0; other ranks hold an empty
    /// view with the same logical Cartesian size. Collective.
    pub fn create_cartesian(
        comm: C,
        dims: [usize; 3],
        cell_size: [f64; 3],
    ) -> Result<Self, MeshScatterError> {
        Self::create_cartesian_on(comm, DistributionConfig::default(), dims, cell_size)
    }

    /// Like [`Grid::create_cartesian`], building on `config.root_rank`.
    ///
    /// Fails on every rank, without communicating, if the root rank is not
    /// part of `comm`.
    pub fn create_cartesian_on(
        comm: C,
        config: DistributionConfig,
        dims: [usize; 3],
        cell_size: [f64; 3],
    ) -> Result<Self, MeshScatterError> {
        let root = config.root_rank;
        check_root(&comm, root)?;
        let serial = if comm.rank() == root {
            let wire = dims.map(|d| WireU64::of(d as u64));
            broadcast_bytes(&comm, root, tags::CARTESIAN_SIZE, cast_slice(&wire))?;
            GridData::cartesian(dims, cell_size)
        } else {
            let bytes = broadcast_bytes(&comm, root, tags::CARTESIAN_SIZE, &[])?;
            let mut size = [0usize; 3];
            let dims = decode_records::<WireU64>(&bytes, root)?;
            if dims.len() != 3 {
                return Err(MeshScatterError::CommError {
                    neighbor: root,
                    message: format!("expected 3 Cartesian dimensions, got {}", dims.len()),
                });
            }
            for (s, d) in size.iter_mut().zip(&dims) {
                *s = d.get() as usize;
            }
            GridData::empty(size)
        };
        Ok(Self::from_data(comm, serial).with_config(config))
    }

    pub fn with_config(mut self, config: DistributionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn state(&self) -> DistributionState {
        self.state
    }

    /// Distribute the serial grid with the configured partitioner.
    ///
    /// Returns `Skipped` without touching the grid when it is already
    /// distributed, when a previous attempt failed, or when only one process
    /// participates. Any error is fatal for the collective operation and
    /// leaves the grid in [`DistributionState::Failed`].
    pub fn scatter_grid(
        &mut self,
        method: EdgeWeightMethod,
        wells: Option<&[Well]>,
        transmissibilities: Option<&[f64]>,
        overlap_layers: usize,
    ) -> Result<ScatterStatus, MeshScatterError> {
        let provider = RootPartitioner::new(self.config.backend);
        self.scatter_grid_with(&provider, method, wells, transmissibilities, overlap_layers)
    }

    /// [`Grid::scatter_grid`] with an explicit partition provider.
    pub fn scatter_grid_with<P: PartitionProvider>(
        &mut self,
        provider: &P,
        method: EdgeWeightMethod,
        wells: Option<&[Well]>,
        transmissibilities: Option<&[f64]>,
        overlap_layers: usize,
    ) -> Result<ScatterStatus, MeshScatterError> {
        match self.state {
            // `Distributing` only exists while `distribute` runs; listed for exhaustiveness.
            DistributionState::Distributed | DistributionState::Distributing => {
                log::warn!("There is already a distributed version of the grid. Refusing to distribute again.");
                return Ok(ScatterStatus::Skipped(SkipReason::AlreadyDistributed));
            }
            DistributionState::Failed => {
                log::warn!("A previous attempt to distribute the grid failed. Not retrying.");
                return Ok(ScatterStatus::Skipped(SkipReason::PreviouslyFailed));
            }
            DistributionState::Undistributed => {}
        }
        if self.comm.size() <= 1 {
            log::warn!("Only one process detected. Grid will not be distributed.");
            return Ok(ScatterStatus::Skipped(SkipReason::SingleProcess));
        }
        check_root(&self.comm, self.config.root_rank)?;

        self.state = DistributionState::Distributing;
        match self.distribute(provider, method, wells, transmissibilities, overlap_layers) {
            Ok((local, interfaces, defunct_wells)) => {
                self.distributed = Some(local);
                self.cell_interfaces = interfaces;
                self.active = ActiveView::Distributed;
                self.state = DistributionState::Distributed;
                Ok(ScatterStatus::Distributed { defunct_wells })
            }
            Err(e) => {
                self.state = DistributionState::Failed;
                log::error!("rank {}: grid distribution failed: {e}", self.comm.rank());
                Err(e)
            }
        }
    }

    fn distribute<P: PartitionProvider>(
        &self,
        provider: &P,
        method: EdgeWeightMethod,
        wells: Option<&[Well]>,
        transmissibilities: Option<&[f64]>,
        overlap_layers: usize,
    ) -> Result<(GridData, InterfaceMap, BTreeSet<String>), MeshScatterError> {
        let root = self.config.root_rank;
        let rank = self.comm.rank();

        let PartitionResult {
            cell_part,
            defunct_wells,
            mut export_list,
            mut import_list,
        } = provider.partition(&self.serial, wells, transmissibilities, &self.comm, method, root)?;

        let num_imported_owner = add_overlap_layer(
            &self.serial,
            &cell_part,
            &mut export_list,
            &mut import_list,
            &self.comm,
            root,
            overlap_layers,
        )?;

        let index = build_distributed_index(
            &export_list,
            &mut import_list,
            num_imported_owner,
            self.config.ordering,
        )?;
        index.index_set.debug_assert_invariants();

        let local = distribute_global_grid(&self.serial, &index, &self.comm, root)?;
        let cells = local.num_cells();
        log::info!("After load balancing process {rank} has {cells} cells.");

        let counts = all_gather_u64(&self.comm, tags::CELL_COUNTS, cells as u64)?;
        if let Some(empty) = counts.iter().position(|&c| c == 0) {
            let cells = counts[empty] as usize;
            log::error!("After load balancing process {empty} has {cells} cells. Aborting.");
            return Err(MeshScatterError::EmptyPartition { rank: empty, cells });
        }
        Ok((local, index.interfaces, defunct_wells))
    }

    /// The view accessors read from.
    pub fn current_view(&self) -> &GridData {
        match (self.active, &self.distributed) {
            (ActiveView::Distributed, Some(d)) => d,
            _ => &self.serial,
        }
    }

    pub fn serial_view(&self) -> &GridData {
        &self.serial
    }

    pub fn distributed_view(&self) -> Option<&GridData> {
        self.distributed.as_ref()
    }

    pub fn switch_to_serial_view(&mut self) {
        self.active = ActiveView::Serial;
    }

    /// Returns `false` (and stays on the serial view) if there is no
    /// distributed view.
    pub fn switch_to_distributed_view(&mut self) -> bool {
        if self.distributed.is_some() {
            self.active = ActiveView::Distributed;
            true
        } else {
            false
        }
    }

    pub fn is_distributed_view_active(&self) -> bool {
        self.active == ActiveView::Distributed
    }

    pub fn num_cells(&self) -> usize {
        self.current_view().num_cells()
    }

    pub fn global_cell(&self) -> &[usize] {
        self.current_view().global_cell()
    }

    pub fn logical_cartesian_size(&self) -> [usize; 3] {
        self.current_view().logical_cartesian_size()
    }

    pub fn cell_index_set(&self) -> &ParallelIndexSet {
        self.current_view().cell_index_set()
    }

    /// Send and receive interfaces of the cells, per neighbor rank. Empty
    /// until the grid is distributed.
    pub fn cell_interfaces(&self) -> &InterfaceMap {
        &self.cell_interfaces
    }
}
