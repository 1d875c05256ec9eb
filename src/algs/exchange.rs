//! Collective helpers built on [`Communicator`] point-to-point messages.
//!
//! Variable-sized payloads travel as two messages: a [`WireCount`] header on
//! the base tag, then the payload on `tag.offset(1)` (omitted when empty).
//! Every helper posts all of its sends before waiting on any receive and
//! drains every send handle before returning, even if a receive failed.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireCount, WireU64, cast_slice, decode_records, expect_exact_len};
use crate::mesh_error::MeshScatterError;
use std::mem::size_of;

fn drain<H: Wait>(handles: Vec<H>) {
    for h in handles {
        let _ = h.wait();
    }
}

fn missing(peer: usize, what: &str) -> MeshScatterError {
    MeshScatterError::CommError {
        neighbor: peer,
        message: format!("failed to receive {what} from rank {peer}"),
    }
}

/// Post a length-prefixed message to `peer`; returns the send handles.
pub fn send_message<C: Communicator>(
    comm: &C,
    peer: usize,
    tag: CommTag,
    payload: &[u8],
) -> Vec<C::SendHandle> {
    let header = WireCount::new(payload.len());
    let mut handles = Vec::with_capacity(2);
    handles.push(comm.isend(
        peer,
        tag.as_u16(),
        cast_slice(std::slice::from_ref(&header)),
    ));
    if !payload.is_empty() {
        handles.push(comm.isend(peer, tag.offset(1).as_u16(), payload));
    }
    handles
}

/// Receive a message posted with [`send_message`].
pub fn recv_message<C: Communicator>(
    comm: &C,
    peer: usize,
    tag: CommTag,
) -> Result<Vec<u8>, MeshScatterError> {
    let mut header = [0u8; size_of::<WireCount>()];
    let data = comm
        .irecv(peer, tag.as_u16(), &mut header)
        .wait()
        .ok_or_else(|| missing(peer, "size header"))?;
    expect_exact_len(data.len(), size_of::<WireCount>(), peer)?;
    let len = decode_records::<WireCount>(&data, peer)?[0].get();
    if len == 0 {
        return Ok(Vec::new());
    }
    let mut buf = vec![0u8; len];
    let data = comm
        .irecv(peer, tag.offset(1).as_u16(), &mut buf)
        .wait()
        .ok_or_else(|| missing(peer, "payload"))?;
    expect_exact_len(data.len(), len, peer)?;
    Ok(data)
}

/// Broadcast `payload` from `root`; non-root callers pass an empty slice.
pub fn broadcast_bytes<C: Communicator>(
    comm: &C,
    root: usize,
    tag: CommTag,
    payload: &[u8],
) -> Result<Vec<u8>, MeshScatterError> {
    if comm.rank() != root {
        return recv_message(comm, root, tag);
    }
    let mut pending = Vec::new();
    for peer in (0..comm.size()).filter(|&p| p != root) {
        pending.extend(send_message(comm, peer, tag, payload));
    }
    drain(pending);
    Ok(payload.to_vec())
}

/// Send `per_rank[r]` from `root` to every rank `r`; returns this rank's part.
///
/// Only the root reads `per_rank`, which must then hold one entry per rank.
pub fn scatter_from_root<C: Communicator>(
    comm: &C,
    root: usize,
    tag: CommTag,
    per_rank: &[Vec<u8>],
) -> Result<Vec<u8>, MeshScatterError> {
    if comm.rank() != root {
        return recv_message(comm, root, tag);
    }
    if per_rank.len() != comm.size() {
        return Err(MeshScatterError::CommError {
            neighbor: root,
            message: format!(
                "root holds {} payloads for {} ranks",
                per_rank.len(),
                comm.size()
            ),
        });
    }
    let mut pending = Vec::new();
    for (peer, payload) in per_rank.iter().enumerate().filter(|&(p, _)| p != root) {
        pending.extend(send_message(comm, peer, tag, payload));
    }
    drain(pending);
    Ok(per_rank[root].clone())
}

/// Every rank contributes one value; every rank gets all values by rank.
pub fn all_gather_u64<C: Communicator>(
    comm: &C,
    tag: CommTag,
    value: u64,
) -> Result<Vec<u64>, MeshScatterError> {
    let me = comm.rank();
    let wire = WireU64::of(value);

    // 1) post all sends
    let mut pending = Vec::with_capacity(comm.size());
    for peer in (0..comm.size()).filter(|&p| p != me) {
        pending.push(comm.isend(
            peer,
            tag.as_u16(),
            cast_slice(std::slice::from_ref(&wire)),
        ));
    }

    // 2) receive from everyone (but do not early-return)
    let mut values = vec![0u64; comm.size()];
    values[me] = value;
    let mut maybe_err = None;
    for peer in (0..comm.size()).filter(|&p| p != me) {
        let mut buf = [0u8; size_of::<WireU64>()];
        let received = comm
            .irecv(peer, tag.as_u16(), &mut buf)
            .wait()
            .ok_or_else(|| missing(peer, "value"))
            .and_then(|data| {
                expect_exact_len(data.len(), size_of::<WireU64>(), peer)?;
                decode_records::<WireU64>(&data, peer)
            });
        match received {
            Ok(v) if maybe_err.is_none() => values[peer] = v[0].get(),
            Err(e) if maybe_err.is_none() => maybe_err = Some(e),
            _ => {}
        }
    }

    // 3) always drain sends
    drain(pending);
    match maybe_err {
        Some(err) => Err(err),
        None => Ok(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::run_world;

    #[test]
    fn broadcast_reaches_every_rank() {
        let got = run_world(3, |comm| {
            let payload: &[u8] = if comm.rank() == 1 { b"halo" } else { &[] };
            broadcast_bytes(&comm, 1, CommTag::new(0x100), payload).unwrap()
        });
        assert!(got.iter().all(|g| g.as_slice() == b"halo"));
    }

    #[test]
    fn scatter_delivers_per_rank_parts() {
        let got = run_world(3, |comm| {
            let parts = if comm.rank() == 0 {
                vec![vec![0u8], Vec::new(), vec![2u8, 2]]
            } else {
                Vec::new()
            };
            scatter_from_root(&comm, 0, CommTag::new(0x200), &parts).unwrap()
        });
        assert_eq!(got, vec![vec![0], vec![], vec![2, 2]]);
    }

    #[test]
    fn all_gather_orders_by_rank() {
        let got = run_world(4, |comm| {
            all_gather_u64(&comm, CommTag::new(0x300), 10 * comm.rank() as u64).unwrap()
        });
        for values in got {
            assert_eq!(values, vec![0, 10, 20, 30]);
        }
    }
}
