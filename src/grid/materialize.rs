//! Build the local grid fragment of each rank from the root's serial grid.
//!
//! Cell records move through the interface map built for the distribution:
//! the root reads its serial arrays at the send-list positions, every rank
//! writes what it receives at the receive-list positions. Faces and the
//! logical Cartesian size are broadcast; each rank keeps the faces whose two
//! cells it holds.

use crate::algs::communicator::{CommTag, Communicator, Wait, tags};
use crate::algs::distribute::DistributedIndex;
use crate::algs::exchange::{broadcast_bytes, recv_message, send_message};
use crate::algs::wire::{WireCell, WireFace, WireU64, cast_slice, decode_records};
use crate::data::interface::InterfaceMap;
use crate::grid::data::GridData;
use crate::mesh_error::MeshScatterError;
use bytemuck::{Pod, Zeroable};

fn out_of_range(what: &str, index: usize, len: usize) -> MeshScatterError {
    MeshScatterError::InvalidGridData(format!(
        "{what} index {index} outside an array of {len} cells"
    ))
}

/// Forward scatter of per-cell values along `interfaces`.
///
/// For every neighbor, `source` is read at the send-list indices and the
/// values land in `target` at the neighbor's receive-list indices on the
/// other side. Messages to this rank itself are copied locally. Collective
/// over the ranks that share interfaces.
pub fn scatter_cell_values<C, T>(
    comm: &C,
    interfaces: &InterfaceMap,
    source: &[T],
    target: &mut [T],
    tag: CommTag,
) -> Result<(), MeshScatterError>
where
    C: Communicator,
    T: Pod,
{
    let mut pending = Vec::new();
    let result = post_sends(comm, interfaces, source, tag, &mut pending)
        .and_then(|()| receive_values(comm, interfaces, source, target, tag));
    for h in pending {
        let _ = h.wait();
    }
    result
}

fn gather<T: Pod>(source: &[T], list: &[usize]) -> Result<Vec<T>, MeshScatterError> {
    list.iter()
        .map(|&i| {
            source
                .get(i)
                .copied()
                .ok_or_else(|| out_of_range("send", i, source.len()))
        })
        .collect()
}

fn post_sends<C: Communicator, T: Pod>(
    comm: &C,
    interfaces: &InterfaceMap,
    source: &[T],
    tag: CommTag,
    pending: &mut Vec<C::SendHandle>,
) -> Result<(), MeshScatterError> {
    let me = comm.rank();
    for (rank, entry) in interfaces.iter() {
        if rank != me && !entry.send.is_empty() {
            let values = gather(source, entry.send.as_slice())?;
            pending.extend(send_message(comm, rank, tag, cast_slice(&values)));
        }
    }
    Ok(())
}

fn receive_values<C: Communicator, T: Pod>(
    comm: &C,
    interfaces: &InterfaceMap,
    source: &[T],
    target: &mut [T],
    tag: CommTag,
) -> Result<(), MeshScatterError> {
    let me = comm.rank();
    if let Some(own) = interfaces.get(me) {
        let values = gather(source, own.send.as_slice())?;
        place(target, own.recv.as_slice(), &values, me)?;
    }
    for (rank, entry) in interfaces.iter() {
        if rank != me && !entry.recv.is_empty() {
            let bytes = recv_message(comm, rank, tag)?;
            let values = decode_records::<T>(&bytes, rank)?;
            place(target, entry.recv.as_slice(), &values, rank)?;
        }
    }
    Ok(())
}

fn place<T: Copy>(
    target: &mut [T],
    recv: &[usize],
    values: &[T],
    peer: usize,
) -> Result<(), MeshScatterError> {
    if values.len() != recv.len() {
        return Err(MeshScatterError::CommError {
            neighbor: peer,
            message: format!("expected {} cell values, got {}", recv.len(), values.len()),
        });
    }
    let len = target.len();
    for (&i, &v) in recv.iter().zip(values) {
        *target.get_mut(i).ok_or_else(|| out_of_range("receive", i, len))? = v;
    }
    Ok(())
}

/// Materialize this rank's fragment of `serial` (populated on `root` only).
///
/// Local cell `l` of the result is the cell the index set maps to `l`; the
/// result carries a copy of that index set.
pub fn distribute_global_grid<C: Communicator>(
    serial: &GridData,
    index: &DistributedIndex,
    comm: &C,
    root: usize,
) -> Result<GridData, MeshScatterError> {
    let is_root = comm.rank() == root;
    let n_local = index.index_set.len();

    let source: Vec<WireCell> = if is_root {
        (0..serial.num_cells())
            .map(|c| {
                WireCell::new(
                    serial.global_cell()[c],
                    serial.cell_volume(c).unwrap_or_default(),
                    serial.cell_centroid(c).unwrap_or_default(),
                )
            })
            .collect()
    } else {
        Vec::new()
    };
    let mut cells = vec![WireCell::zeroed(); n_local];
    scatter_cell_values(comm, &index.interfaces, &source, &mut cells, tags::CELL_DATA)?;

    let faces: Vec<WireFace> = if is_root {
        serial
            .face_cells()
            .iter()
            .map(|&[a, b]| WireFace::new(a, b))
            .collect()
    } else {
        Vec::new()
    };
    let faces = broadcast_bytes(comm, root, tags::FACES, cast_slice(&faces))?;
    let local_faces: Vec<[usize; 2]> = decode_records::<WireFace>(&faces, root)?
        .iter()
        .filter_map(|f| {
            let [a, b] = f.cells();
            Some([
                index.index_set.get(a)?.local,
                index.index_set.get(b)?.local,
            ])
        })
        .collect();

    let size: Vec<WireU64> = if is_root {
        serial
            .logical_cartesian_size()
            .iter()
            .map(|&d| WireU64::of(d as u64))
            .collect()
    } else {
        Vec::new()
    };
    let size = broadcast_bytes(comm, root, tags::CARTESIAN_SIZE, cast_slice(&size))?;
    let size = decode_records::<WireU64>(&size, root)?;
    let logical_cartesian_size = match size.as_slice() {
        [x, y, z] => [x.get() as usize, y.get() as usize, z.get() as usize],
        _ => {
            return Err(MeshScatterError::CommError {
                neighbor: root,
                message: format!("expected 3 Cartesian dimensions, got {}", size.len()),
            });
        }
    };

    let mut local = GridData::from_parts(
        logical_cartesian_size,
        cells.iter().map(WireCell::cartesian).collect(),
        cells.iter().map(WireCell::volume).collect(),
        cells.iter().map(WireCell::centroid).collect(),
        local_faces,
    )?;
    local.set_cell_index_set(index.index_set.clone());
    log::debug!(
        "rank {}: materialized {} cells and {} faces",
        comm.rank(),
        local.num_cells(),
        local.num_faces()
    );
    Ok(local)
}
