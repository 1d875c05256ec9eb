//! Fixed, little-endian wire types for the distribution pipeline.
//!
//! All multi-byte fields are stored pre-LE with `.to_le()` and decoded with
//! `.from_le()`; floating point values travel as their bit patterns.
//! Received buffers carry no alignment guarantee, so decoding goes through
//! [`decode_records`], which reads each record unaligned.

use crate::mesh_error::MeshScatterError;
use crate::topology::ownership::Attribute;
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Decode a byte buffer into records, rejecting trailing bytes.
pub fn decode_records<T: Pod>(bytes: &[u8], peer: usize) -> Result<Vec<T>, MeshScatterError> {
    let size = size_of::<T>();
    if size == 0 || bytes.len() % size != 0 {
        return Err(MeshScatterError::CommError {
            neighbor: peer,
            message: format!(
                "payload of {} bytes is not a multiple of the {size}-byte record",
                bytes.len()
            ),
        });
    }
    Ok(bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

pub fn expect_exact_len(actual: usize, expected: usize, peer: usize) -> Result<(), MeshScatterError> {
    if actual == expected {
        Ok(())
    } else {
        Err(MeshScatterError::CommError {
            neighbor: peer,
            message: format!("expected {expected} bytes, got {actual}"),
        })
    }
}

/// Length prefix sent ahead of every variable-sized payload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u64,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u64).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u64::from_le(self.n_le) as usize
    }
}

/// A single `u64` value (cell indices, ranks, counts).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireU64 {
    pub v_le: u64,
}

impl WireU64 {
    pub fn of(v: u64) -> Self {
        Self { v_le: v.to_le() }
    }
    pub fn get(&self) -> u64 {
        u64::from_le(self.v_le)
    }
}

/// One overlap cell sent from the root to the rank that will hold it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireOverlap {
    pub global_le: u64,
    pub attribute: u8,
    pub _pad: [u8; 7],
}

impl WireOverlap {
    pub fn new(global: usize, attribute: Attribute) -> Self {
        Self {
            global_le: (global as u64).to_le(),
            attribute: attribute.code(),
            _pad: [0; 7],
        }
    }
    pub fn global(&self) -> usize {
        u64::from_le(self.global_le) as usize
    }
    pub fn attribute(&self) -> Result<Attribute, MeshScatterError> {
        Attribute::from_code(self.attribute)
    }
}

/// Per-cell payload scattered by the materializer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCell {
    pub cartesian_le: u64,
    pub volume_bits_le: u64,
    pub centroid_bits_le: [u64; 3],
}

impl WireCell {
    pub fn new(cartesian: usize, volume: f64, centroid: [f64; 3]) -> Self {
        Self {
            cartesian_le: (cartesian as u64).to_le(),
            volume_bits_le: volume.to_bits().to_le(),
            centroid_bits_le: centroid.map(|c| c.to_bits().to_le()),
        }
    }
    pub fn cartesian(&self) -> usize {
        u64::from_le(self.cartesian_le) as usize
    }
    pub fn volume(&self) -> f64 {
        f64::from_bits(u64::from_le(self.volume_bits_le))
    }
    pub fn centroid(&self) -> [f64; 3] {
        self.centroid_bits_le.map(|b| f64::from_bits(u64::from_le(b)))
    }
}

/// An interior face between two global cells.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireFace {
    pub c0_le: u64,
    pub c1_le: u64,
}

impl WireFace {
    pub fn new(c0: usize, c1: usize) -> Self {
        Self {
            c0_le: (c0 as u64).to_le(),
            c1_le: (c1 as u64).to_le(),
        }
    }
    pub fn cells(&self) -> [usize; 2] {
        [
            u64::from_le(self.c0_le) as usize,
            u64::from_le(self.c1_le) as usize,
        ]
    }
}

const_assert_eq!(size_of::<WireCount>(), 8);
const_assert_eq!(size_of::<WireOverlap>(), 16);
const_assert_eq!(size_of::<WireCell>(), 40);
const_assert_eq!(size_of::<WireFace>(), 16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_unaligned_records() {
        let faces = [WireFace::new(1, 2), WireFace::new(3, 4)];
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(cast_slice(&faces));
        let decoded: Vec<WireFace> = decode_records(&bytes[1..], 0).unwrap();
        assert_eq!(decoded[1].cells(), [3, 4]);
    }

    #[test]
    fn decode_rejects_partial_records() {
        let err = decode_records::<WireFace>(&[0u8; 17], 2).unwrap_err();
        assert!(matches!(err, MeshScatterError::CommError { neighbor: 2, .. }));
    }

    #[test]
    fn cell_payload_preserves_floats() {
        let c = WireCell::new(17, 0.125, [1.5, -2.0, 3.25]);
        assert_eq!(c.cartesian(), 17);
        assert_eq!(c.volume(), 0.125);
        assert_eq!(c.centroid(), [1.5, -2.0, 3.25]);
    }

    #[test]
    fn overlap_attribute_codes() {
        let o = WireOverlap::new(5, Attribute::Copy);
        assert_eq!(o.global(), 5);
        assert_eq!(o.attribute(), Ok(Attribute::Copy));
        let bad = WireOverlap {
            attribute: 9,
            ..o
        };
        assert!(bad.attribute().is_err());
    }
}
