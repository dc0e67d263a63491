//! Vertex data layout for meshes drawn by the shadow pipeline.

pub mod layout;

pub use layout::{
    MESH_GENERICS_ATTRIBUTES, MESH_GENERICS_STRIDE, MESH_POSITIONS_ATTRIBUTES,
    MESH_POSITIONS_STRIDE, PositionNormal, Texcoord, VertexAttributeDescriptor, VertexBufferDescriptor,
    VertexDescriptor, VertexFormat, VertexStepMode,
};
