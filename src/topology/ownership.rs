//! Ownership attributes for distributed cells.
//!
//! Every cell held by a process carries an [`Attribute`]: exactly one process
//! is the `Owner` of a global cell, any number of others may hold read-mostly
//! halo copies tagged `Overlap` or `Copy`. The numeric codes are the ones used
//! on the wire (`owner = 1`, `overlap = 2`, `copy = 3`).

use crate::mesh_error::MeshScatterError;
use std::fmt;

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Attribute {
    /// Authoritative, writable copy.
    Owner,
    /// Halo copy that takes part in overlapping computations.
    Overlap,
    /// Halo copy that is only read.
    Copy,
}

impl Attribute {
    /// Wire code of this attribute.
    pub const fn code(self) -> u8 {
        match self {
            Attribute::Owner => 1,
            Attribute::Overlap => 2,
            Attribute::Copy => 3,
        }
    }

    /// Decode a wire code.
    pub fn from_code(code: u8) -> Result<Self, MeshScatterError> {
        match code {
            1 => Ok(Attribute::Owner),
            2 => Ok(Attribute::Overlap),
            3 => Ok(Attribute::Copy),
            other => Err(MeshScatterError::UnknownAttribute(other)),
        }
    }

    /// Returns true for `Owner`.
    pub const fn is_owner(self) -> bool {
        matches!(self, Attribute::Owner)
    }

    /// Returns true for the halo attributes (`Overlap`, `Copy`).
    pub const fn is_halo(self) -> bool {
        !self.is_owner()
    }
}

impl TryFrom<u8> for Attribute {
    type Error = MeshScatterError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Attribute::from_code(code)
    }
}

/// Single-letter form (`o`, `v`, `c`), handy in logs.
impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Attribute::Owner => 'o',
            Attribute::Overlap => 'v',
            Attribute::Copy => 'c',
        };
        write!(f, "{c}")
    }
}
