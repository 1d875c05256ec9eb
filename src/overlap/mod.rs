//! Overlap module: grows each rank's owned cells by halo layers.
//!
//! The halo is computed on the root from the serial grid and the partition;
//! see [`expand::add_overlap_layer`].

pub mod expand;

pub use expand::add_overlap_layer;
