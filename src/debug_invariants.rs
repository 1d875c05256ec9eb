//! Invariant checking shared by the distributed index structures.

use crate::mesh_error::MeshScatterError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Panic if invariants are violated, in debug builds or when invariant
    /// checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshScatterError>;
}

/// Run a fallible invariant check and panic with context on error when
/// invariant checking is enabled. Compiles to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Check that `locals` is a permutation of `0..len`.
pub fn check_dense_permutation<I>(locals: I, len: usize) -> Result<(), MeshScatterError>
where
    I: IntoIterator<Item = usize>,
{
    let mut seen = vec![false; len];
    let mut count = 0usize;
    for local in locals {
        match seen.get_mut(local) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(MeshScatterError::NonDenseLocalIndex { local, len }),
        }
        count += 1;
    }
    if count != len {
        // fewer values than slots: report the first hole
        let hole = seen.iter().position(|s| !s).unwrap_or(len);
        return Err(MeshScatterError::NonDenseLocalIndex { local: hole, len });
    }
    Ok(())
}
