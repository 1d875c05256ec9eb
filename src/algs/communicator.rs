//! Thin façade over inter-process message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees). Send
//! handles must be waited on before a helper returns. Receive handles yield
//! the message bytes, truncated to the length of the buffer passed to
//! `irecv`.
//!
//! Backends:
//! - [`NoComm`]: a single process, rank 0 of 1;
//! - [`RayonComm`]: several ranks inside one OS process (one thread per rank),
//!   exchanging through a shared mailbox;
//! - `MpiComm` (feature `mpi-support`): one OS process per rank.
//!
//! Sends never block. The MPI backend completes a receive eagerly, so every
//! caller posts its sends before waiting on the receives they pair with.

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Arc;

/// Message tag. Helpers that exchange several messages derive the
/// sub-tags from one base with [`CommTag::offset`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    pub const fn base(self) -> u16 {
        self.0
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    pub const fn offset(self, k: u16) -> Self {
        Self(self.0.wrapping_add(k))
    }
}

/// Tags used by the distribution pipeline; each stage owns a disjoint range.
pub mod tags {
    use super::CommTag;

    pub const PARTITION: CommTag = CommTag::new(0x5C00);
    pub const DEFUNCT_WELLS: CommTag = CommTag::new(0x5C10);
    pub const OVERLAP: CommTag = CommTag::new(0x5C20);
    pub const CELL_DATA: CommTag = CommTag::new(0x5C30);
    pub const FACES: CommTag = CommTag::new(0x5C40);
    pub const CARTESIAN_SIZE: CommTag = CommTag::new(0x5C50);
    pub const CELL_COUNTS: CommTag = CommTag::new(0x5C60);
}

/// Non-blocking point-to-point communication.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Rank of this process.
    fn rank(&self) -> usize;
    /// Number of participating processes.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Single-process communicator; every exchange is empty.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// --- RayonComm: ranks as threads of one process ---
type Key = (usize, usize, u16); // (src, dst, tag)
type Mailbox = DashMap<Key, VecDeque<Bytes>>;

static MAILBOX: Lazy<Arc<Mailbox>> = Lazy::new(|| Arc::new(DashMap::new()));

/// Receive handle of [`RayonComm`]; polls the mailbox on `wait`.
pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    len: usize,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        loop {
            if let Some(mut queue) = self.mailbox.get_mut(&self.key) {
                if let Some(bytes) = queue.pop_front() {
                    let n = self.len.min(bytes.len());
                    return Some(bytes[..n].to_vec());
                }
            }
            std::thread::yield_now();
        }
    }
}

/// In-process communicator. Messages between a (source, destination, tag)
/// triple are delivered in FIFO order.
#[derive(Clone, Debug)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl RayonComm {
    /// Rank `rank` of `size`, sharing the process-global mailbox.
    ///
    /// All communicators created this way see each other's messages; tests
    /// using it must not run concurrently with the same tags.
    pub fn new(rank: usize, size: usize) -> Self {
        Self {
            rank,
            size,
            mailbox: Arc::clone(&MAILBOX),
        }
    }

    /// `size` communicators sharing a private mailbox, indexed by rank.
    pub fn world(size: usize) -> Vec<Self> {
        let mailbox: Arc<Mailbox> = Arc::new(DashMap::new());
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let key = (self.rank, peer, tag);
        self.mailbox
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        LocalHandle {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
            len: buf.len(),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Wait};
    use crate::mesh_error::MeshScatterError;
    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    pub struct MpiComm {
        pub world: SimpleCommunicator,
        pub rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, MeshScatterError> {
            let universe = mpi::initialize().ok_or(MeshScatterError::CommInit)?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// Pending send; owns a copy of the message until completion.
    pub struct MpiSendHandle {
        req: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.req.wait();
            // SAFETY: `buf` came from `Box::leak` in `isend` and the request
            // referencing it has completed.
            drop(unsafe { Box::from_raw(self.buf) });
            None
        }
    }

    /// Completed receive.
    pub struct MpiRecvHandle(Vec<u8>);

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            Some(self.0)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSendHandle {
            let leaked: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let ptr: *mut [u8] = leaked;
            // SAFETY: the allocation stays alive until `MpiSendHandle::wait`.
            let data: &'static [u8] = unsafe { &*ptr };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, data, tag as i32);
            MpiSendHandle { req, buf: ptr }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiRecvHandle {
            let (data, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(tag as i32);
            let n = buf.len().min(data.len());
            buf[..n].copy_from_slice(&data[..n]);
            MpiRecvHandle(data[..n].to_vec())
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

/// Run `f` once per rank of a fresh [`RayonComm::world`], one thread each.
#[cfg(test)]
pub(crate) fn run_world<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(RayonComm) -> T + Sync,
{
    let world = RayonComm::world(size);
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rayon_roundtrip_two_ranks() {
        let world = RayonComm::world(2);
        let (comm0, comm1) = (&world[0], &world[1]);

        let mut recv_buf = [0u8; 4];
        comm0.isend(1, 7, &[1, 2, 3, 4]).wait();
        let data = comm1
            .irecv(0, 7, &mut recv_buf)
            .wait()
            .expect("Expected to receive data from rank 0");
        recv_buf.copy_from_slice(&data);
        assert_eq!(&recv_buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn world_mailboxes_are_isolated() {
        let a = RayonComm::world(2);
        let b = RayonComm::world(2);
        a[0].isend(1, 3, &[1]);
        b[0].isend(1, 3, &[2]);
        let mut buf = [0u8; 1];
        assert_eq!(b[1].irecv(0, 3, &mut buf).wait(), Some(vec![2]));
        assert_eq!(a[1].irecv(0, 3, &mut buf).wait(), Some(vec![1]));
    }

    #[test]
    fn no_comm_is_single_rank() {
        let comm = NoComm;
        assert_eq!((comm.rank(), comm.size()), (0, 1));
        let mut buf = [0u8; 2];
        assert_eq!(comm.irecv(0, 1, &mut buf).wait(), None);
    }

    #[test]
    fn tag_offsets() {
        assert_eq!(tags::OVERLAP.offset(1).base(), 0x5C21);
        assert_eq!(CommTag(u16::MAX).offset(1), CommTag(0));
    }
}
