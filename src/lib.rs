//! Shader Types - the host/shader layout contract of a shadow-mapping pipeline
//!
//! Host code and WGSL shaders must agree on three sets of slot numbers and on
//! the byte layout of the per-draw uniform block. This crate is the single
//! place those numbers live:
//!
//! - [`BufferIndex`], [`VertexAttribute`], [`TextureIndex`] - binding slots
//! - [`Uniforms`] - projection, model-view and shadow-view matrices (192 bytes)
//! - [`shader::SHADER_TYPES_WGSL`] - the same contract spelled in WGSL
//!
//! Around the contract:
//! - [`mesh`] - the vertex input layout the attribute slots refer to
//! - [`resources::UniformRing`] - per-frame staging of aligned uniform blocks
//! - [`math`] - matrix helpers for filling [`Uniforms`]
//! - [`shader::reflect`] - naga-based check that a shader matches the host
//! - `wgpu_compat` (feature `wgpu`) - wgpu descriptor values for the layout

pub mod error;
pub mod math;
pub mod mesh;
pub mod resources;
pub mod shader;
pub mod types;

#[cfg(feature = "wgpu")]
pub mod wgpu_compat;

pub use error::{Result, ShaderTypesError};
pub use mesh::VertexDescriptor;
pub use resources::{UniformAllocation, UniformRing, UniformRingConfig};
pub use shader::{BindingScheme, ContractReport, ContractViolation, ShaderComposer};
pub use types::{
    ALIGNED_UNIFORMS_SIZE, BufferIndex, TextureIndex, UNIFORMS_ALIGNMENT, UNIFORMS_SIZE,
    Uniforms, VertexAttribute,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
