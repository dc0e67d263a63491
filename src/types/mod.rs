//! The host half of the shared layout: slot numbers and the uniform block.

pub mod slots;
pub mod uniforms;

pub use slots::{BufferIndex, TextureIndex, VertexAttribute};
pub use uniforms::{
    ALIGNED_UNIFORMS_SIZE, UNIFORMS_ALIGNMENT, UNIFORMS_SIZE, Uniforms, align_up,
};
