//! Host-side resources that carry the shared layout.

pub mod uniform_ring;

pub use uniform_ring::{UniformAllocation, UniformRing, UniformRingConfig};
